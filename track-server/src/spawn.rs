use rand::Rng;
use rapier3d::prelude::*;

use crate::course::CourseLayout;
use crate::vehicle::{Color, VehicleId};

// Red, Green, Blue, Yellow, Cyan, Magenta, White, DarkGray
pub const PALETTE: [Color; 8] = [
    0xff0000, 0x00ff00, 0x0000ff, 0xffff00, 0x00ffff, 0xff00ff, 0xf0f0f0, 0x303030,
];

pub const SPAWN_HEIGHT: Real = 2.0;
const END_MARGIN: Real = 5.0;

// ---------------------------------------------
// SPAWN RESULT RETURNED TO THE SIMULATION
// ---------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnInfo {
    pub id: VehicleId,
    pub color: Color,
    pub position: Vector<Real>,
}

pub fn palette_color(id: VehicleId) -> Color {
    PALETTE[(id.0 % PALETTE.len() as u64) as usize]
}

// ---------------------------------------------
// ID / COLOR / POSITION ALLOCATOR
// ---------------------------------------------
#[derive(Debug, Default)]
pub struct SpawnManager {
    /// Next id to hand out. Only ever grows.
    next_id: u64,
}

impl SpawnManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_identity(&mut self) -> (VehicleId, Color) {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        (id, palette_color(id))
    }

    /// Random point on the -X straight: X jitters within a quarter width of
    /// the lane centre, Z anywhere along the straight short of its ends.
    pub fn allocate_spawn(&mut self, layout: &CourseLayout) -> SpawnInfo {
        let mut rng = rand::thread_rng();

        let lane_x = -layout.spacing * 0.5;
        let jitter = layout.straight_width * 0.25;
        let reach = (layout.half_length() - END_MARGIN).max(0.0);

        let x = lane_x + rng.gen_range(-jitter..=jitter);
        let z = rng.gen_range(-reach..=reach);

        self.allocate_at(vector![x, SPAWN_HEIGHT, z])
    }

    /// Same identity pipeline, caller-chosen spawn point.
    pub fn allocate_at(&mut self, position: Vector<Real>) -> SpawnInfo {
        let (id, color) = self.next_identity();
        SpawnInfo { id, color, position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::is_on_course;

    #[test]
    fn test_ids_are_sequential_and_colors_cycle() {
        let layout = CourseLayout::default();
        let mut spawner = SpawnManager::new();

        for n in 0..20u64 {
            let info = spawner.allocate_spawn(&layout);
            assert_eq!(info.id, VehicleId(n));
            assert_eq!(info.color, PALETTE[(n % 8) as usize]);
        }
    }

    #[test]
    fn test_spawn_points_lie_on_course() {
        let layout = CourseLayout::default();
        let mut spawner = SpawnManager::new();

        for _ in 0..200 {
            let info = spawner.allocate_spawn(&layout);
            assert!(is_on_course(&layout, &info.position), "{:?}", info.position);
            assert!(info.position.x < 0.0);
            assert_eq!(info.position.y, SPAWN_HEIGHT);
        }
    }

    #[test]
    fn test_allocate_at_shares_the_id_counter() {
        let layout = CourseLayout::default();
        let mut spawner = SpawnManager::new();

        let a = spawner.allocate_spawn(&layout);
        let b = spawner.allocate_at(vector![0.0, 2.0, 1000.0]);
        let c = spawner.allocate_spawn(&layout);

        assert_eq!([a.id, b.id, c.id], [VehicleId(0), VehicleId(1), VehicleId(2)]);
        assert_eq!(b.position, vector![0.0, 2.0, 1000.0]);
        assert_eq!(b.color, PALETTE[1]);
    }
}
