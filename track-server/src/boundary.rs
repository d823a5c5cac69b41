// src/boundary.rs

use rapier3d::prelude::*;
use std::f32::consts::PI;

use crate::course::{CornerSide, CourseLayout};

/// Planar on/off-course test against the two straights and two corners.
/// Only X and Z of `position` are read.
pub fn is_on_course(layout: &CourseLayout, position: &Vector<Real>) -> bool {
    on_straight(layout, position.x, position.z)
        || on_corner(layout, CornerSide::North, position.x, position.z)
        || on_corner(layout, CornerSide::South, position.x, position.z)
}

fn on_straight(layout: &CourseLayout, x: Real, z: Real) -> bool {
    let half_s = layout.spacing * 0.5;
    let half_w = layout.straight_width * 0.5;
    let half_l = layout.half_length();

    let in_left = x >= -half_s - half_w && x <= -half_s + half_w;
    let in_right = x >= half_s - half_w && x <= half_s + half_w;

    (in_left || in_right) && z >= -half_l && z <= half_l
}

fn on_corner(layout: &CourseLayout, side: CornerSide, x: Real, z: Real) -> bool {
    let (cx, cz) = layout.corner_center(side);
    let dx = x - cx;
    let dz = z - cz;

    let d2 = dx * dx + dz * dz;
    let r_in = layout.inner_radius();
    let r_out = layout.outer_radius();
    if d2 < r_in * r_in || d2 > r_out * r_out {
        return false;
    }

    let angle = dz.atan2(dx);
    match side {
        CornerSide::North => z >= cz && (0.0..=PI).contains(&angle),
        CornerSide::South => z <= cz && (-PI..=0.0).contains(&angle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: Real, z: Real) -> Vector<Real> {
        vector![x, 0.5, z]
    }

    #[test]
    fn test_straight_bands_are_on_course() {
        let layout = CourseLayout::default();
        for x in [-29.9, -25.0, -20.1, 20.1, 25.0, 29.9] {
            for z in [-75.0, -40.0, 0.0, 40.0, 75.0] {
                assert!(is_on_course(&layout, &at(x, z)), "({x}, {z}) should be on course");
            }
        }
    }

    #[test]
    fn test_infield_and_outfield_are_off_course() {
        let layout = CourseLayout::default();
        assert!(!is_on_course(&layout, &at(0.0, 0.0)));
        assert!(!is_on_course(&layout, &at(-19.0, 10.0)));
        assert!(!is_on_course(&layout, &at(31.0, -10.0)));
        assert!(!is_on_course(&layout, &at(-25.0, 1000.0)));
    }

    #[test]
    fn test_corner_annulus_interior() {
        let layout = CourseLayout::default();
        let r_mid = (layout.inner_radius() + layout.outer_radius()) * 0.5;
        let half_l = layout.half_length();

        for i in 1..16 {
            let a = PI * i as Real / 16.0;
            let (s, c) = a.sin_cos();
            assert!(is_on_course(&layout, &at(r_mid * c, half_l + r_mid * s)));
            assert!(is_on_course(&layout, &at(r_mid * c, -half_l - r_mid * s)));
        }
    }

    #[test]
    fn test_corner_just_outside_radii_is_off_course() {
        let layout = CourseLayout::default();
        let half_l = layout.half_length();
        let eps = 0.01;

        // Straight "up" from each corner centre, clear of the straights' X bands.
        let inside_inner = layout.inner_radius() - eps;
        let outside_outer = layout.outer_radius() + eps;
        assert!(!is_on_course(&layout, &at(0.0, half_l + inside_inner)));
        assert!(!is_on_course(&layout, &at(0.0, half_l + outside_outer)));
        assert!(!is_on_course(&layout, &at(0.0, -half_l - inside_inner)));
        assert!(!is_on_course(&layout, &at(0.0, -half_l - outside_outer)));

        let just_inside_inner = layout.inner_radius() + eps;
        let just_inside_outer = layout.outer_radius() - eps;
        assert!(is_on_course(&layout, &at(0.0, half_l + just_inside_inner)));
        assert!(is_on_course(&layout, &at(0.0, half_l + just_inside_outer)));
        assert!(is_on_course(&layout, &at(0.0, -half_l - just_inside_inner)));
        assert!(is_on_course(&layout, &at(0.0, -half_l - just_inside_outer)));
    }

    #[test]
    fn test_corner_requires_correct_half_plane() {
        let layout = CourseLayout::default();
        let half_l = layout.half_length();
        // Inside corner 1's annulus radially, but on the wrong side of its
        // centre line and away from the straights.
        assert!(!on_corner(&layout, CornerSide::North, 0.0, half_l - 25.0));
        assert!(!on_corner(&layout, CornerSide::South, 0.0, -half_l + 25.0));
        assert!(!is_on_course(&layout, &at(0.0, half_l - 25.0)));
    }
}
