use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::physics::Pose;
use crate::registry::ConnectionId;
use crate::simulation::Simulation;
use crate::vehicle::{Color, VehicleId};

// ---------------------------------------------
// WIRE TYPES (SERVER -> CLIENT)
// ---------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisState {
    pub position: Vec3,
    pub quaternion: Quat,
}

pub type WheelState = ChassisState;

impl From<Pose> for ChassisState {
    fn from(pose: Pose) -> Self {
        let q = pose.rotation.into_inner();
        Self {
            position: Vec3 {
                x: pose.position.x,
                y: pose.position.y,
                z: pose.position.z,
            },
            quaternion: Quat {
                x: q.i,
                y: q.j,
                z: q.k,
                w: q.w,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    pub id: String,
    pub chassis: ChassisState,
    pub wheels: Vec<WheelState>,
    pub speed: f32,
    pub color: Color,
    pub on_course: bool,
}

/// Full world state, resent every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub vehicles: Vec<VehicleSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    YourVehicleId { id: String, color: Color },
    VehicleRemoved { id: String },
    Pong,
}

impl ServerMessage {
    pub fn welcome(id: VehicleId, color: Color) -> Self {
        ServerMessage::YourVehicleId { id: id.to_string(), color }
    }

    pub fn removed(id: VehicleId) -> Self {
        ServerMessage::VehicleRemoved { id: id.to_string() }
    }
}

// ---------------------------------------------
// OUTBOUND FAN-OUT
// ---------------------------------------------
#[derive(Default)]
pub struct Broadcaster {
    clients: BTreeMap<ConnectionId, UnboundedSender<String>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn: ConnectionId, tx: UnboundedSender<String>) {
        self.clients.insert(conn, tx);
    }

    pub fn unregister(&mut self, conn: ConnectionId) -> bool {
        self.clients.remove(&conn).is_some()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Queues `msg` for one client. False if it is gone.
    pub fn send_to(&self, conn: ConnectionId, msg: &str) -> bool {
        match self.clients.get(&conn) {
            Some(tx) => tx.send(msg.to_owned()).is_ok(),
            None => false,
        }
    }

    /// Fire-and-forget to every client; closed ones are skipped. Returns how
    /// many accepted the message.
    pub fn broadcast(&self, msg: &str) -> usize {
        let mut delivered = 0;
        for (conn, tx) in &self.clients {
            if tx.send(msg.to_owned()).is_ok() {
                delivered += 1;
            } else {
                debug!("Skipping closed client {}", conn);
            }
        }
        delivered
    }
}

// ---------------------------------------------
// SHARED SERVER STATE
// ---------------------------------------------
pub struct ServerState {
    pub sim: Simulation,
    pub clients: Broadcaster,
}

pub type SharedState = Arc<Mutex<ServerState>>;

impl ServerState {
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            clients: Broadcaster::new(),
        }
    }

    pub fn shared(sim: Simulation) -> SharedState {
        Arc::new(Mutex::new(Self::new(sim)))
    }

    /// Runs one simulation tick and pushes the snapshot to every client.
    pub fn tick_and_broadcast(&mut self) {
        let report = self.sim.tick();
        match serde_json::to_string(&report.snapshot) {
            Ok(json) => {
                self.clients.broadcast(&json);
            }
            Err(e) => error!("Failed to serialize snapshot at tick {}: {}", report.tick, e),
        }
    }
}

/// Fixed-rate driver. The physics timestep comes from the simulation config,
/// never from wall-clock deltas.
pub async fn run_tick_loop(state: SharedState, tick_rate: u32) {
    let mut ticker = interval(Duration::from_secs_f64(1.0 / tick_rate.max(1) as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Simulation loop running at {} Hz", tick_rate);

    loop {
        ticker.tick().await;
        state.lock().await.tick_and_broadcast();
    }
}
