// src/simulation.rs
//
// One tick = inputs -> controllers -> physics step -> fall resets -> snapshot.

use log::{info, warn};
use rapier3d::prelude::*;

use crate::boundary::is_on_course;
use crate::config::SimulationConfig;
use crate::course::CourseLayout;
use crate::error::{ServerError, ServerResult};
use crate::physics::PhysicsWorld;
use crate::registry::{ConnectionId, Registry};
use crate::spawn::{SpawnInfo, SpawnManager};
use crate::state::{ChassisState, VehicleSnapshot, WheelState, WorldSnapshot};
use crate::vehicle::{Color, VehicleId};

#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub snapshot: WorldSnapshot,
    /// Vehicles returned to their spawn point this tick.
    pub resets: Vec<VehicleId>,
}

pub struct Simulation {
    pub config: SimulationConfig,
    pub layout: CourseLayout,
    pub physics: PhysicsWorld,
    pub registry: Registry,
    spawner: SpawnManager,
    tick: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig, layout: CourseLayout) -> Self {
        Self {
            physics: PhysicsWorld::new(config.gravity, &layout),
            config,
            layout,
            registry: Registry::new(),
            spawner: SpawnManager::new(),
            tick: 0,
        }
    }

    /// Spawns a vehicle somewhere on the course and registers it.
    pub fn on_connect(&mut self) -> (ConnectionId, VehicleId, Color) {
        let info = self.spawner.allocate_spawn(&self.layout);
        self.register(info)
    }

    /// Like `on_connect`, at a fixed spawn point.
    pub fn spawn_at(&mut self, position: Vector<Real>) -> (ConnectionId, VehicleId, Color) {
        let info = self.spawner.allocate_at(position);
        self.register(info)
    }

    fn register(&mut self, info: SpawnInfo) -> (ConnectionId, VehicleId, Color) {
        let vehicle = self.physics.spawn_vehicle(
            info.id,
            info.color,
            info.position,
            &self.config.vehicle,
            self.config.on_course_damping,
        );
        let conn = self.registry.register(vehicle);

        info!(
            "Vehicle {} created with color 0x{:06x} for {} at {:?}",
            info.id,
            info.color,
            conn,
            [info.position.x, info.position.y, info.position.z]
        );
        (conn, info.id, info.color)
    }

    pub fn on_input(&mut self, conn: ConnectionId, dx: Option<f32>, dz: Option<f32>) -> ServerResult<()> {
        if self.registry.update_input(conn, dx, dz) {
            Ok(())
        } else {
            Err(ServerError::UnknownConnection(conn))
        }
    }

    /// Despawns the connection's vehicle. Returns the freed id the first time,
    /// `None` on every later call.
    pub fn on_disconnect(&mut self, conn: ConnectionId) -> Option<VehicleId> {
        let entry = self.registry.remove(conn)?;
        self.physics.despawn_vehicle(&entry.vehicle);
        info!("Vehicle {} removed.", entry.vehicle.id);
        Some(entry.vehicle.id)
    }

    pub fn tick(&mut self) -> TickReport {
        let dt = self.config.timestep;
        let max_force = self.config.max_engine_force;
        let max_steer = self.config.max_steer_angle;

        // 1) Inputs + damping policy
        for (_, entry) in self.registry.iter_mut() {
            entry.vehicle.apply_input(&entry.input, max_force, max_steer);

            let on_course = self
                .physics
                .chassis_pose(&entry.vehicle)
                .map(|pose| is_on_course(&self.layout, &pose.position))
                .unwrap_or(false);
            let damping = if on_course {
                self.config.on_course_damping
            } else {
                self.config.off_course_damping
            };
            entry.vehicle.on_course = on_course;
            self.physics.set_linear_damping(&entry.vehicle, damping);
        }

        // 2) Controllers, then one fixed step
        for (_, entry) in self.registry.iter_mut() {
            self.physics.update_vehicle(&mut entry.vehicle, dt);
        }
        self.physics.step(dt);
        self.tick += 1;

        // 3) Fall resets
        let mut resets = Vec::new();
        for (_, entry) in self.registry.iter() {
            let Some(pose) = self.physics.chassis_pose(&entry.vehicle) else {
                continue;
            };
            let p = pose.position;
            let fallen = p.y < self.config.fall_reset_y
                || !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
            if fallen {
                warn!("Vehicle {} fell, resetting to initial position.", entry.vehicle.id);
                self.physics.reset_vehicle(&entry.vehicle);
                resets.push(entry.vehicle.id);
            }
        }

        TickReport {
            tick: self.tick,
            snapshot: self.snapshot(),
            resets,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let vehicles = self
            .registry
            .iter()
            .filter_map(|(_, entry)| {
                let vehicle = &entry.vehicle;
                let chassis = self.physics.chassis_pose(vehicle)?;
                let speed = self.physics.linvel(vehicle).map(|v| v.norm()).unwrap_or(0.0);
                Some(VehicleSnapshot {
                    id: vehicle.id.to_string(),
                    chassis: ChassisState::from(chassis),
                    wheels: self
                        .physics
                        .wheel_poses(vehicle)
                        .into_iter()
                        .map(WheelState::from)
                        .collect(),
                    speed,
                    color: vehicle.color,
                    on_course: vehicle.on_course,
                })
            })
            .collect();

        WorldSnapshot { vehicles }
    }
}
