use glam::Vec2;
use std::f32::consts::PI;

use crate::math::{Aabb, Vec2Ext};

/// Density/restitution/friction triple shared by many bodies.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub density: f32,
    /// Bounciness in [0, 1].
    pub restitution: f32,
    /// Coulomb coefficient in [0, 1].
    pub friction: f32,
}

impl Material {
    pub const DEFAULT: Material = Material {
        density: 1.0,
        restitution: 0.2,
        friction: 0.3,
    };
    pub const RUBBER: Material = Material {
        density: 1.2,
        restitution: 0.8,
        friction: 0.9,
    };
    pub const ICE: Material = Material {
        density: 0.9,
        restitution: 0.05,
        friction: 0.02,
    };
    pub const METAL: Material = Material {
        density: 7.8,
        restitution: 0.1,
        friction: 0.4,
    };
    pub const WOOD: Material = Material {
        density: 0.6,
        restitution: 0.3,
        friction: 0.5,
    };
    pub const BOUNCY: Material = Material {
        density: 0.5,
        restitution: 0.95,
        friction: 0.2,
    };

    /// Clamps restitution and friction into [0, 1] and density to >= 0.
    pub fn new(density: f32, restitution: f32, friction: f32) -> Self {
        Self {
            density: density.max(0.0),
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.clamp(0.0, 1.0),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Collider geometry in body-local space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned box; it does not rotate with the body.
    Box { half_extents: Vec2 },
    /// Counter-clockwise or clockwise vertex loop. Has mass and bounds but no
    /// narrow-phase detector.
    Polygon { vertices: Vec<Vec2> },
}

/// A shape plus its offset from the body origin.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Collider {
    pub shape: Shape,
    pub offset: Vec2,
}

/// Mass and rotational inertia derived from a collider and a density.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MassProperties {
    pub mass: f32,
    pub inertia: f32,
}

impl Collider {
    pub fn circle(radius: f32) -> Self {
        Self {
            shape: Shape::Circle {
                radius: radius.abs(),
            },
            offset: Vec2::ZERO,
        }
    }

    /// Axis-aligned box from half width / half height.
    pub fn rect(half_width: f32, half_height: f32) -> Self {
        Self {
            shape: Shape::Box {
                half_extents: Vec2::new(half_width, half_height).abs(),
            },
            offset: Vec2::ZERO,
        }
    }

    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Self {
            shape: Shape::Polygon { vertices },
            offset: Vec2::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Mass and inertia about the body origin for the given density. An
    /// offset collider picks up the parallel-axis term `m * d^2`.
    pub fn mass_properties(&self, density: f32) -> MassProperties {
        // local inertia is about the collider origin; `centroid` is in the same frame
        let (local, centroid) = match &self.shape {
            Shape::Circle { radius } => {
                let mass = PI * radius * radius * density;
                let inertia = 0.5 * mass * radius * radius;
                (MassProperties { mass, inertia }, Vec2::ZERO)
            }
            Shape::Box { half_extents: h } => {
                let mass = (2.0 * h.x) * (2.0 * h.y) * density;
                let inertia = mass * (h.x * h.x + h.y * h.y) / 3.0;
                (MassProperties { mass, inertia }, Vec2::ZERO)
            }
            Shape::Polygon { vertices } => polygon_mass(vertices, density),
        };
        let shift = (self.offset + centroid).length_squared() - centroid.length_squared();
        MassProperties {
            mass: local.mass,
            inertia: local.inertia + local.mass * shift,
        }
    }

    /// Collider center in world space for a body at `position` rotated by `angle`.
    pub fn world_center(&self, position: Vec2, angle: f32) -> Vec2 {
        position + self.offset.rotated(angle)
    }

    /// World-space bounds at the given pose.
    pub fn bounds(&self, position: Vec2, angle: f32) -> Aabb {
        let center = self.world_center(position, angle);
        match &self.shape {
            Shape::Circle { radius } => {
                Aabb::from_center_half_extents(center, Vec2::splat(*radius))
            }
            Shape::Box { half_extents } => Aabb::from_center_half_extents(center, *half_extents),
            Shape::Polygon { vertices } => {
                Aabb::from_points(vertices.iter().map(|v| center + v.rotated(angle)))
                    .unwrap_or(Aabb {
                        min: center,
                        max: center,
                    })
            }
        }
    }

    /// Exact containment test for a world-space point.
    pub fn contains_point(&self, position: Vec2, angle: f32, p: Vec2) -> bool {
        let center = self.world_center(position, angle);
        match &self.shape {
            Shape::Circle { radius } => (p - center).length_squared() <= radius * radius,
            Shape::Box { half_extents } => {
                Aabb::from_center_half_extents(center, *half_extents).contains_point(p)
            }
            Shape::Polygon { vertices } => point_in_polygon(vertices, (p - center).rotated(-angle)),
        }
    }
}

/// Shoelace area plus the standard second-moment sum, taken about the local
/// origin. Also returns the centroid.
fn polygon_mass(vertices: &[Vec2], density: f32) -> (MassProperties, Vec2) {
    let n = vertices.len();
    if n < 3 {
        return (MassProperties::default(), Vec2::ZERO);
    }
    let mut area2 = 0.0;
    let mut moment = 0.0;
    let mut first = Vec2::ZERO;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = a.perp_dot(b);
        area2 += c;
        moment += c * (a.dot(a) + a.dot(b) + b.dot(b));
        first += (a + b) * c;
    }
    // winding only flips the sign of the sums
    let mass = (area2 * 0.5).abs() * density;
    let inertia = (moment / 12.0).abs() * density;
    let centroid = if area2.abs() > f32::EPSILON {
        first / (3.0 * area2)
    } else {
        Vec2::ZERO
    };
    (MassProperties { mass, inertia }, centroid)
}

fn point_in_polygon(vertices: &[Vec2], p: Vec2) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(h: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(-h, -h),
            Vec2::new(h, -h),
            Vec2::new(h, h),
            Vec2::new(-h, h),
        ]
    }

    #[test]
    fn test_circle_mass() {
        let mp = Collider::circle(2.0).mass_properties(3.0);
        assert_relative_eq!(mp.mass, PI * 4.0 * 3.0, max_relative = 1e-6);
        assert_relative_eq!(mp.inertia, 0.5 * mp.mass * 4.0, max_relative = 1e-6);
    }

    #[test]
    fn test_box_mass() {
        let mp = Collider::rect(2.0, 1.0).mass_properties(0.5);
        assert_relative_eq!(mp.mass, 4.0);
        assert_relative_eq!(mp.inertia, 4.0 * 5.0 / 3.0, max_relative = 1e-6);
    }

    #[test]
    fn test_polygon_mass_matches_box() {
        let poly = Collider::polygon(square(1.0)).mass_properties(2.0);
        let boxed = Collider::rect(1.0, 1.0).mass_properties(2.0);
        assert_relative_eq!(poly.mass, boxed.mass, max_relative = 1e-5);
        assert_relative_eq!(poly.inertia, boxed.inertia, max_relative = 1e-5);

        // clockwise winding gives the same result
        let mut cw = square(1.0);
        cw.reverse();
        let poly_cw = Collider::polygon(cw).mass_properties(2.0);
        assert_relative_eq!(poly_cw.mass, boxed.mass, max_relative = 1e-5);
    }

    #[test]
    fn test_offset_adds_parallel_axis_term() {
        let centered = Collider::circle(2.0).mass_properties(1.0);
        let shifted = Collider::circle(2.0)
            .with_offset(Vec2::new(3.0, 0.0))
            .mass_properties(1.0);
        assert_relative_eq!(shifted.mass, centered.mass);
        assert_relative_eq!(
            shifted.inertia,
            0.5 * centered.mass * 4.0 + 9.0 * centered.mass,
            max_relative = 1e-6
        );

        let boxed = Collider::rect(1.0, 1.0).mass_properties(2.0);
        let poly = Collider::polygon(square(1.0))
            .with_offset(Vec2::new(0.0, 2.0))
            .mass_properties(2.0);
        assert_relative_eq!(poly.inertia, boxed.inertia + 4.0 * boxed.mass, max_relative = 1e-5);
    }

    #[test]
    fn test_off_center_polygon_inertia_about_origin() {
        // unit-half square whose centroid sits at (1, 1)
        let verts = square(1.0).into_iter().map(|v| v + Vec2::ONE).collect();
        let mp = Collider::polygon(verts).mass_properties(1.0);
        let boxed = Collider::rect(1.0, 1.0).mass_properties(1.0);
        assert_relative_eq!(mp.mass, boxed.mass, max_relative = 1e-5);
        assert_relative_eq!(mp.inertia, boxed.inertia + 2.0 * boxed.mass, max_relative = 1e-5);
    }

    #[test]
    fn test_degenerate_polygon_is_massless() {
        let mp = Collider::polygon(vec![Vec2::ZERO, Vec2::X]).mass_properties(1.0);
        assert_eq!(mp, MassProperties::default());
    }

    #[test]
    fn test_bounds_with_offset_and_rotation() {
        let c = Collider::circle(1.0).with_offset(Vec2::new(2.0, 0.0));
        let b = c.bounds(Vec2::ZERO, std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(b.center().x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(b.center().y, 2.0, epsilon = 1e-5);

        let r = Collider::rect(2.0, 1.0).bounds(Vec2::new(5.0, 5.0), 1.0);
        assert_eq!(r.min, Vec2::new(3.0, 4.0));
        assert_eq!(r.max, Vec2::new(7.0, 6.0));
    }

    #[test]
    fn test_contains_point() {
        let p = Collider::polygon(square(1.0));
        assert!(p.contains_point(Vec2::ZERO, 0.0, Vec2::new(0.5, 0.5)));
        assert!(!p.contains_point(Vec2::ZERO, 0.0, Vec2::new(1.5, 0.0)));
        assert!(Collider::circle(1.0).contains_point(Vec2::ZERO, 0.0, Vec2::new(0.0, 1.0)));
        assert!(!Collider::rect(1.0, 1.0).contains_point(Vec2::ZERO, 0.0, Vec2::new(0.0, 1.5)));
    }

    #[test]
    fn test_material_clamps() {
        let m = Material::new(-1.0, 2.0, -0.5);
        let expected = Material {
            density: 0.0,
            restitution: 1.0,
            friction: 0.0,
        };
        assert_eq!(m, expected);
    }
}
