use rapier3d::control::{DynamicRayCastVehicleController, WheelTuning};
use rapier3d::prelude::*;
use std::fmt;

/// Packed 0xRRGGBB display color.
pub type Color = u32;

/// Process-unique vehicle id. Never reused, even after the vehicle is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vehicle-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WheelSpec {
    pub debug_id: &'static str, // "FR", "FL", "RR", "RL"
    pub offset: [f32; 3],       // chassis local space
    pub steer: bool,
    pub drive: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct VehicleConfig {
    pub mass: f32,                      // kg
    pub chassis_half_extents: [f32; 3], // [hx, hy, hz] meters
    pub friction: f32,
    pub restitution: f32,

    // --- Wheels ---
    pub wheel_radius: f32,
    pub suspension_rest_length: f32,
    pub suspension_stiffness: f32,
    pub suspension_compression: f32,
    pub suspension_relaxation: f32,
    pub max_suspension_travel: f32,
    pub friction_slip: f32,
    pub max_suspension_force: f32,
    pub wheels: [WheelSpec; 4],
}

impl VehicleConfig {
    pub fn tuning(&self) -> WheelTuning {
        WheelTuning {
            suspension_stiffness: self.suspension_stiffness,
            suspension_compression: self.suspension_compression,
            suspension_damping: self.suspension_relaxation,
            max_suspension_travel: self.max_suspension_travel,
            friction_slip: self.friction_slip,
            max_suspension_force: self.max_suspension_force,
            ..WheelTuning::default()
        }
    }

    fn volume(&self) -> f32 {
        let [hx, hy, hz] = self.chassis_half_extents;
        8.0 * hx * hy * hz
    }

    pub fn density(&self) -> f32 {
        self.mass / self.volume()
    }
}

// 1 x 0.5 x 2 box on four small wheels, front steer / rear drive.
pub const ROADSTER: VehicleConfig = VehicleConfig {
    mass: 150.0,
    chassis_half_extents: [0.5, 0.25, 1.0],
    friction: 0.3,
    restitution: 0.1,

    wheel_radius: 0.3,
    suspension_rest_length: 0.3,
    suspension_stiffness: 30.0,
    suspension_compression: 4.4,
    suspension_relaxation: 2.3,
    max_suspension_travel: 0.3,
    friction_slip: 1.4,
    max_suspension_force: 100_000.0,
    wheels: [
        WheelSpec { debug_id: "FR", offset: [ 0.55, -0.15,  0.8], steer: true,  drive: false },
        WheelSpec { debug_id: "FL", offset: [-0.55, -0.15,  0.8], steer: true,  drive: false },
        WheelSpec { debug_id: "RR", offset: [ 0.55, -0.15, -0.8], steer: false, drive: true  },
        WheelSpec { debug_id: "RL", offset: [-0.55, -0.15, -0.8], steer: false, drive: true  },
    ],
};

/// Latest control intent for one connection. Last write wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub steer: f32,    // -1.0 .. 1.0
    pub throttle: f32, // -1.0 .. 1.0
}

pub struct Vehicle {
    pub id: VehicleId,
    pub color: Color,
    pub spawn: Vector<Real>,  // reset target
    pub body: RigidBodyHandle, // the chassis body
    pub controller: DynamicRayCastVehicleController,
    pub wheels: [WheelSpec; 4], // same order as the controller's wheels
    pub on_course: bool,
}

impl Vehicle {
    /// Engine force on `drive` wheels, steering on `steer` wheels, no brakes.
    pub fn apply_input(&mut self, input: &InputState, max_force: f32, max_steer: f32) {
        let engine_force = input.throttle * max_force;
        let steering = -input.steer * max_steer;

        for (wheel, spec) in self.controller.wheels_mut().iter_mut().zip(&self.wheels) {
            wheel.engine_force = if spec.drive { engine_force } else { 0.0 };
            wheel.steering = if spec.steer { steering } else { 0.0 };
            wheel.brake = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn rig(config: &VehicleConfig) -> Vehicle {
        let mut bodies = RigidBodySet::new();
        let body = bodies.insert(RigidBodyBuilder::dynamic().build());
        let mut controller = DynamicRayCastVehicleController::new(body);
        let tuning = config.tuning();
        for spec in config.wheels {
            let [x, y, z] = spec.offset;
            controller.add_wheel(point![x, y, z], vector![0.0, -1.0, 0.0], vector![1.0, 0.0, 0.0], 0.3, 0.3, &tuning);
        }

        Vehicle {
            id: VehicleId(0),
            color: 0xff0000,
            spawn: vector![0.0, 2.0, 0.0],
            body,
            controller,
            wheels: config.wheels,
            on_course: true,
        }
    }

    #[test]
    fn test_vehicle_id_display() {
        assert_eq!(VehicleId(0).to_string(), "vehicle-0");
        assert_eq!(VehicleId(42).to_string(), "vehicle-42");
    }

    #[test]
    fn test_roadster_mass_from_density() {
        let config = ROADSTER;
        assert_approx_eq!(config.density() * config.volume(), config.mass);
    }

    #[test]
    fn test_wheel_layout_is_symmetric() {
        let wheels = ROADSTER.wheels;
        assert!(wheels[..2].iter().all(|w| w.steer && !w.drive));
        assert!(wheels[2..].iter().all(|w| w.drive && !w.steer));
        for pair in [[0, 1], [2, 3]] {
            let [a, b] = pair.map(|i| wheels[i].offset);
            assert_approx_eq!(a[0], -b[0]);
            assert_approx_eq!(a[1], b[1]);
            assert_approx_eq!(a[2], b[2]);
        }
    }

    #[test]
    fn test_apply_input_targets_correct_wheels() {
        let mut vehicle = rig(&ROADSTER);
        vehicle.controller.wheels_mut()[3].brake = 5.0;
        vehicle.apply_input(&InputState { steer: 1.0, throttle: -1.0 }, 200.0, 0.5);

        let wheels = vehicle.controller.wheels();
        assert_approx_eq!(wheels[0].steering, -0.5);
        assert_approx_eq!(wheels[1].steering, -0.5);
        assert_approx_eq!(wheels[2].steering, 0.0);
        assert_approx_eq!(wheels[0].engine_force, 0.0);
        assert_approx_eq!(wheels[2].engine_force, -200.0);
        assert_approx_eq!(wheels[3].engine_force, -200.0);
        assert!(wheels.iter().all(|w| w.brake == 0.0));
    }

    #[test]
    fn test_wheel_flags_choose_drive_and_steer() {
        let mut config = ROADSTER;
        for spec in config.wheels.iter_mut() {
            spec.drive = true;
        }
        config.wheels[0].steer = false;
        config.wheels[3].steer = true;

        let mut vehicle = rig(&config);
        vehicle.apply_input(&InputState { steer: -1.0, throttle: 0.5 }, 200.0, 0.5);

        let wheels = vehicle.controller.wheels();
        assert!(wheels.iter().all(|w| w.engine_force == 100.0));
        let steering: Vec<f32> = wheels.iter().map(|w| w.steering).collect();
        assert_eq!(steering, vec![0.0, 0.5, 0.0, 0.5]);
    }
}
