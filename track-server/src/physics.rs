// src/physics.rs

use log::{debug, info};
use nalgebra::UnitQuaternion;
use rapier3d::control::DynamicRayCastVehicleController;
use rapier3d::prelude::*;

use crate::course::{CourseLayout, GROUP_CHASSIS, GROUP_GROUND};
use crate::vehicle::{Vehicle, VehicleConfig, VehicleId, Color};

/// World transform of a chassis or wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector<Real>,
    pub rotation: UnitQuaternion<Real>,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,                // gravity vector
    pub pipeline: PhysicsPipeline,            // physics pipeline
    pub island_manager: IslandManager,        // manages islands of bodies
    pub broad_phase: DefaultBroadPhase,       // broad-phase collision detection
    pub narrow_phase: NarrowPhase,            // collision detection
    pub bodies: RigidBodySet,                 // for rigid bodies
    pub colliders: ColliderSet,               // for collision shapes
    pub joints: ImpulseJointSet,              // for constraints
    pub multibody_joints: MultibodyJointSet,  // for articulated bodies
    pub ccd: CCDSolver,                       // continuous collision detection
    pub query_pipeline: QueryPipeline,        // for wheel raycasts
}

impl PhysicsWorld {
    pub fn new(gravity: [Real; 3], layout: &CourseLayout) -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let course = layout.build(&mut bodies, &mut colliders);

        let mut query_pipeline = QueryPipeline::new();
        query_pipeline.update(&colliders);

        info!(
            "Physics world ready. Course bodies = {}, Colliders = {}",
            course.len(),
            colliders.len()
        );

        Self {
            gravity: vector![gravity[0], gravity[1], gravity[2]],
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline,
        }
    }

    /// Chassis box + 4-wheel ray-cast rig, dropped at `spawn`.
    pub fn spawn_vehicle(
        &mut self,
        id: VehicleId,
        color: Color,
        spawn: Vector<Real>,
        config: &VehicleConfig,
        linear_damping: Real,
    ) -> Vehicle {
        // Rigid body
        let rb = RigidBodyBuilder::dynamic()
            .translation(spawn)
            .linear_damping(linear_damping)
            .ccd_enabled(true)
            .build();

        // Box collider
        let [hx, hy, hz] = config.chassis_half_extents;
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(
                GROUP_CHASSIS,
                GROUP_GROUND | GROUP_CHASSIS,
            ))
            .density(config.density())
            .friction(config.friction)
            .restitution(config.restitution)
            .build();

        let body = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, body, &mut self.bodies);

        // Wheels: forward +Z, up +Y, axle +X.
        let mut controller = DynamicRayCastVehicleController::new(body);
        controller.index_up_axis = 1;
        controller.index_forward_axis = 2;

        let tuning = config.tuning();
        for wheel in &config.wheels {
            let [x, y, z] = wheel.offset;
            controller.add_wheel(
                point![x, y, z],
                vector![0.0, -1.0, 0.0],
                vector![1.0, 0.0, 0.0],
                config.suspension_rest_length,
                config.wheel_radius,
                &tuning,
            );
        }

        debug!(
            "Rigged {} with wheels [{}] on body {:?}",
            id,
            config.wheels.map(|w| w.debug_id).join(", "),
            body
        );

        Vehicle {
            id,
            color,
            spawn,
            body,
            controller,
            wheels: config.wheels,
            on_course: true,
        }
    }

    /// Removes the chassis and its colliders. A no-op for a body that is
    /// already gone.
    pub fn despawn_vehicle(&mut self, vehicle: &Vehicle) -> bool {
        self.bodies
            .remove(
                vehicle.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Back to the spawn point, upright and at rest.
    pub fn reset_vehicle(&mut self, vehicle: &Vehicle) {
        if let Some(body) = self.bodies.get_mut(vehicle.body) {
            body.set_translation(vehicle.spawn, true);
            body.set_rotation(UnitQuaternion::identity(), true);
            body.set_linvel(vector![0.0, 0.0, 0.0], true);
            body.set_angvel(vector![0.0, 0.0, 0.0], true);
        }
    }

    pub fn set_linear_damping(&mut self, vehicle: &Vehicle, damping: Real) {
        if let Some(body) = self.bodies.get_mut(vehicle.body) {
            body.set_linear_damping(damping);
        }
    }

    /// Suspension, friction and engine impulses for one rig. Must run before
    /// `step` so the impulses land in this tick.
    pub fn update_vehicle(&mut self, vehicle: &mut Vehicle, dt: Real) {
        if !self.bodies.contains(vehicle.body) {
            return;
        }
        let filter = QueryFilter::new()
            .exclude_rigid_body(vehicle.body)
            .groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND));

        vehicle.controller.update_vehicle(
            dt,
            &mut self.bodies,
            &self.colliders,
            &self.query_pipeline,
            filter,
        );
    }

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );
    }

    pub fn chassis_pose(&self, vehicle: &Vehicle) -> Option<Pose> {
        let body = self.bodies.get(vehicle.body)?;
        Some(Pose {
            position: *body.translation(),
            rotation: *body.rotation(),
        })
    }

    pub fn linvel(&self, vehicle: &Vehicle) -> Option<Vector<Real>> {
        self.bodies.get(vehicle.body).map(|b| *b.linvel())
    }

    pub fn angvel(&self, vehicle: &Vehicle) -> Option<Vector<Real>> {
        self.bodies.get(vehicle.body).map(|b| *b.angvel())
    }

    /// Wheel poses from the chassis pose as it is now: the hub sits at
    /// `connection + direction * suspension_length` in chassis space, turned by
    /// steer (about up) and spin (about the axle).
    pub fn wheel_poses(&self, vehicle: &Vehicle) -> Vec<Pose> {
        let Some(body) = self.bodies.get(vehicle.body) else {
            return Vec::new();
        };
        let chassis = body.position();

        vehicle
            .controller
            .wheels()
            .iter()
            .map(|wheel| {
                let hub = wheel.chassis_connection_point_cs
                    + wheel.direction_cs * wheel.raycast_info().suspension_length;
                let steer = UnitQuaternion::from_axis_angle(&Vector::<Real>::y_axis(), wheel.steering);
                let spin = UnitQuaternion::from_axis_angle(&Vector::<Real>::x_axis(), wheel.rotation);
                Pose {
                    position: (chassis * hub).coords,
                    rotation: chassis.rotation * steer * spin,
                }
            })
            .collect()
    }
}
