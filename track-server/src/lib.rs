//! Authoritative physics server for a multiplayer driving demo: one rapier
//! world, one ray-cast vehicle per WebSocket connection, full snapshots every
//! tick.

pub mod boundary;
pub mod config;
pub mod course;
pub mod error;
pub mod net;
pub mod physics;
pub mod registry;
pub mod simulation;
pub mod spawn;
pub mod state;
pub mod vehicle;

pub use config::{ServerArgs, SimulationConfig};
pub use course::CourseLayout;
pub use error::{ServerError, ServerResult};
pub use simulation::{Simulation, TickReport};
pub use state::{ServerState, SharedState};
