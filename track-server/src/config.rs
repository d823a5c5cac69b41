// src/config.rs

use clap::Parser;
use rapier3d::prelude::*;
use std::path::PathBuf;

use crate::vehicle::{VehicleConfig, ROADSTER};

/// Process bootstrap options.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct ServerArgs {
    /// Address to bind the HTTP/WebSocket listener to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,
    /// Port to listen on
    #[clap(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,
    /// Simulation ticks per second
    #[clap(short, long, default_value = "60")]
    pub tick_rate: u32,
    /// Directory with the browser client, served over HTTP on the same port
    #[clap(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl ServerArgs {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tuning for the authoritative loop. Forces are in N, angles in radians.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub timestep: Real,
    pub gravity: [Real; 3],
    pub max_engine_force: Real,
    pub max_steer_angle: Real,
    pub fall_reset_y: Real,
    pub on_course_damping: Real,  // nominal rolling drag
    pub off_course_damping: Real, // "mud"
    pub vehicle: VehicleConfig,
}

impl SimulationConfig {
    pub fn with_tick_rate(tick_rate: u32) -> Self {
        Self {
            timestep: 1.0 / tick_rate.max(1) as Real,
            ..Self::default()
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            gravity: [0.0, -9.82, 0.0],
            max_engine_force: 200.0,
            max_steer_angle: 0.5,
            fall_reset_y: -10.0,
            on_course_damping: 0.15,
            off_course_damping: 0.8,
            vehicle: ROADSTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_tick_rate_sets_timestep() {
        let config = SimulationConfig::with_tick_rate(30);
        assert_approx_eq!(config.timestep, 1.0 / 30.0);
        assert_approx_eq!(config.max_engine_force, 200.0);
    }

    #[test]
    fn test_zero_tick_rate_does_not_divide_by_zero() {
        let config = SimulationConfig::with_tick_rate(0);
        assert!(config.timestep.is_finite());
    }

    #[test]
    fn test_args_defaults() {
        let args = ServerArgs::parse_from(["track-server", "--port", "4000"]);
        assert_eq!(args.bind_addr(), "0.0.0.0:4000");
        assert_eq!(args.tick_rate, 60);
        assert!(args.static_dir.is_none());
    }

    #[test]
    fn test_static_dir_flag() {
        let args = ServerArgs::parse_from(["track-server", "--static-dir", "public"]);
        assert_eq!(args.static_dir, Some(PathBuf::from("public")));
    }
}
