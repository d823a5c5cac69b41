// src/course.rs
//
// Static oval course: two straights joined by two half-annulus corners, plus
// an oversized safety net underneath. Built once at startup, never mutated.

use rapier3d::prelude::*;
use std::f32::consts::PI;

pub const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
pub const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

#[derive(Debug, Clone, Copy)]
pub struct CourseLayout {
    pub straight_length: Real,  // L
    pub straight_width: Real,   // W
    pub spacing: Real,          // S, centre to centre of the straights
    pub thickness: Real,        // h
    pub safety_margin: Real,    // net overhang past the course footprint
    pub safety_depth: Real,     // net top surface below y = 0
    pub safety_thickness: Real,
    pub arc_segments: usize,
}

impl Default for CourseLayout {
    fn default() -> Self {
        Self {
            straight_length: 150.0,
            straight_width: 10.0,
            spacing: 50.0,
            thickness: 0.1,
            safety_margin: 20.0,
            safety_depth: 2.0,
            safety_thickness: 1.0,
            arc_segments: 48,
        }
    }
}

/// Where the annular half-disk of a corner lies relative to its centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornerSide {
    /// +Z end of the oval, swept from π to 0.
    North,
    /// -Z end of the oval, swept from 0 to π and mirrored.
    South,
}

impl CornerSide {
    fn sweep(self) -> (Real, Real, Real) {
        // (start angle, end angle, z sign)
        match self {
            CornerSide::North => (PI, 0.0, 1.0),
            CornerSide::South => (0.0, PI, -1.0),
        }
    }
}

/// Axis-aligned footprint on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub half_x: Real,
    pub half_z: Real,
}

impl CourseLayout {
    pub fn inner_radius(&self) -> Real {
        self.spacing * 0.5 - self.straight_width * 0.5
    }

    pub fn outer_radius(&self) -> Real {
        self.spacing * 0.5 + self.straight_width * 0.5
    }

    pub fn half_length(&self) -> Real {
        self.straight_length * 0.5
    }

    /// Planar centre of a corner's arcs.
    pub fn corner_center(&self, side: CornerSide) -> (Real, Real) {
        match side {
            CornerSide::North => (0.0, self.half_length()),
            CornerSide::South => (0.0, -self.half_length()),
        }
    }

    /// Extent of the drivable surface.
    pub fn footprint(&self) -> Footprint {
        Footprint {
            half_x: self.spacing * 0.5 + self.straight_width * 0.5,
            half_z: self.half_length() + self.outer_radius(),
        }
    }

    pub fn safety_footprint(&self) -> Footprint {
        let course = self.footprint();
        Footprint {
            half_x: course.half_x + self.safety_margin,
            half_z: course.half_z + self.safety_margin,
        }
    }

    /// Y of the safety net's top face. Always below the course's bottom face.
    pub fn safety_top(&self) -> Real {
        -self.thickness - self.safety_depth.max(0.0)
    }

    /// Inserts every static body of the course and returns their handles.
    pub fn build(&self, bodies: &mut RigidBodySet, colliders: &mut ColliderSet) -> Vec<RigidBodyHandle> {
        let ground_groups = InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS);
        let y = -self.thickness * 0.5;
        let mut handles = Vec::with_capacity(5);

        // === Straights ===
        for x in [-self.spacing * 0.5, self.spacing * 0.5] {
            let rb = RigidBodyBuilder::fixed().translation(vector![x, y, 0.0]).build();
            let handle = bodies.insert(rb);
            let collider = ColliderBuilder::cuboid(
                self.straight_width * 0.5,
                self.thickness * 0.5,
                self.half_length(),
            )
            .collision_groups(ground_groups)
            .friction(0.3)
            .restitution(0.1)
            .build();
            colliders.insert_with_parent(collider, handle, bodies);
            handles.push(handle);
        }

        // === Corners ===
        for side in [CornerSide::North, CornerSide::South] {
            let (cx, cz) = self.corner_center(side);
            let (vertices, indices) = self.corner_mesh(side);
            let rb = RigidBodyBuilder::fixed().translation(vector![cx, y, cz]).build();
            let handle = bodies.insert(rb);
            let collider = ColliderBuilder::trimesh(vertices, indices)
                .collision_groups(ground_groups)
                .friction(0.3)
                .restitution(0.1)
                .build();
            colliders.insert_with_parent(collider, handle, bodies);
            handles.push(handle);
        }

        // === Safety net ===
        let net = self.safety_footprint();
        let net_y = self.safety_top() - self.safety_thickness * 0.5;
        let rb = RigidBodyBuilder::fixed().translation(vector![0.0, net_y, 0.0]).build();
        let handle = bodies.insert(rb);
        let collider = ColliderBuilder::cuboid(net.half_x, self.safety_thickness * 0.5, net.half_z)
            .collision_groups(ground_groups)
            .friction(0.3)
            .restitution(0.1)
            .build();
        colliders.insert_with_parent(collider, handle, bodies);
        handles.push(handle);

        log::info!(
            "Course built: L={} W={} S={} (R_inner={}, R_outer={}), {} static bodies",
            self.straight_length,
            self.straight_width,
            self.spacing,
            self.inner_radius(),
            self.outer_radius(),
            handles.len()
        );

        handles
    }

    /// Extruded half-annulus in the corner's local frame, thickness `h`
    /// centred on y = 0.
    pub fn corner_mesh(&self, side: CornerSide) -> (Vec<Point<Real>>, Vec<[u32; 3]>) {
        let (start, end, z_sign) = side.sweep();
        let segments = self.arc_segments.max(2);
        let r_in = self.inner_radius();
        let r_out = self.outer_radius();
        let top = self.thickness * 0.5;
        let bottom = -top;

        // Per ring step: inner-top, outer-top, inner-bottom, outer-bottom.
        let mut vertices = Vec::with_capacity((segments + 1) * 4);
        for i in 0..=segments {
            let t = i as Real / segments as Real;
            let a = start + (end - start) * t;
            let (s, c) = a.sin_cos();
            let (ix, iz) = (r_in * c, z_sign * r_in * s);
            let (ox, oz) = (r_out * c, z_sign * r_out * s);
            vertices.push(point![ix, top, iz]);
            vertices.push(point![ox, top, oz]);
            vertices.push(point![ix, bottom, iz]);
            vertices.push(point![ox, bottom, oz]);
        }

        let mut indices = Vec::with_capacity(segments * 8 + 4);
        for i in 0..segments as u32 {
            let a = i * 4;
            let b = a + 4;
            // top
            indices.push([a, b, a + 1]);
            indices.push([a + 1, b, b + 1]);
            // bottom
            indices.push([a + 2, a + 3, b + 2]);
            indices.push([a + 3, b + 3, b + 2]);
            // inner wall
            indices.push([a, a + 2, b]);
            indices.push([b, a + 2, b + 2]);
            // outer wall
            indices.push([a + 1, b + 1, a + 3]);
            indices.push([b + 1, b + 3, a + 3]);
        }
        // end caps
        let last = segments as u32 * 4;
        indices.push([0, 1, 2]);
        indices.push([1, 3, 2]);
        indices.push([last, last + 2, last + 1]);
        indices.push([last + 1, last + 2, last + 3]);

        (vertices, indices)
    }
}
