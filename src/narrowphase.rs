use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::math::EPSILON;
use crate::shape::{Collider, Shape};
use crate::types::*;

/// Shape-pair detectors and ray primitives.
pub struct Narrowphase;

/// `+1` for non-negative input so a centered shape still gets an axis.
#[inline]
fn sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

impl Narrowphase {
    /// Dispatch on the shape pair. Pairs without a detector (anything
    /// involving a polygon) report no contact.
    pub fn collide(
        a: &Collider,
        a_center: Vec2,
        b: &Collider,
        b_center: Vec2,
        tie: AxisPreference,
    ) -> Option<Contact> {
        match (&a.shape, &b.shape) {
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                Self::circle_circle(a_center, *ra, b_center, *rb)
            }
            (Shape::Circle { radius }, Shape::Box { half_extents }) => {
                Self::circle_box(a_center, *radius, b_center, *half_extents)
            }
            (Shape::Box { half_extents }, Shape::Circle { radius }) => {
                Self::circle_box(b_center, *radius, a_center, *half_extents).map(Contact::flipped)
            }
            (Shape::Box { half_extents: ha }, Shape::Box { half_extents: hb }) => {
                Self::box_box(a_center, *ha, b_center, *hb, tie)
            }
            (Shape::Polygon { .. }, _) | (_, Shape::Polygon { .. }) => None,
        }
    }
}

impl NarrowphaseApi for Narrowphase {
    fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Contact> {
        let delta = cb - ca;
        let dist2 = delta.length_squared();
        let rsum = ra + rb;
        if dist2 >= rsum * rsum {
            return None;
        }
        let dist = dist2.sqrt();
        if dist < EPSILON {
            // Coincident centers; any axis separates them.
            return Some(Contact {
                point: ca,
                normal: Vec2::X,
                depth: rsum,
            });
        }
        let normal = delta / dist;
        Some(Contact {
            point: ca + normal * ra,
            normal,
            depth: rsum - dist,
        })
    }

    fn circle_box(c: Vec2, r: f32, box_c: Vec2, box_h: Vec2) -> Option<Contact> {
        let local = c - box_c;
        let closest = local.clamp(-box_h, box_h);
        let inside = closest == local;

        if !inside {
            let diff = local - closest;
            let dist2 = diff.length_squared();
            if dist2 >= r * r {
                return None;
            }
            let dist = dist2.sqrt();
            // circle center lies outside, so dist > 0
            let normal = -diff / dist;
            return Some(Contact {
                point: box_c + closest,
                normal,
                depth: r - dist,
            });
        }

        // Center inside the box: leave through the nearest face.
        let dx = box_h.x - local.x.abs();
        let dy = box_h.y - local.y.abs();
        if dx <= dy {
            let s = sign(local.x);
            Some(Contact {
                point: box_c + Vec2::new(s * box_h.x, local.y),
                normal: Vec2::new(-s, 0.0),
                depth: r + dx,
            })
        } else {
            let s = sign(local.y);
            Some(Contact {
                point: box_c + Vec2::new(local.x, s * box_h.y),
                normal: Vec2::new(0.0, -s),
                depth: r + dy,
            })
        }
    }

    fn box_box(ca: Vec2, ha: Vec2, cb: Vec2, hb: Vec2, tie: AxisPreference) -> Option<Contact> {
        let d = cb - ca;
        let ox = (ha.x + hb.x) - d.x.abs();
        let oy = (ha.y + hb.y) - d.y.abs();
        if ox <= 0.0 || oy <= 0.0 {
            return None;
        }

        let use_x = match tie {
            AxisPreference::X => ox <= oy,
            AxisPreference::Y => ox < oy,
        };
        let (normal, depth) = if use_x {
            (Vec2::new(sign(d.x), 0.0), ox)
        } else {
            (Vec2::new(0.0, sign(d.y)), oy)
        };

        // Center of the overlap region.
        let lo = (ca - ha).max(cb - hb);
        let hi = (ca + ha).min(cb + hb);
        Some(Contact {
            point: (lo + hi) * 0.5,
            normal,
            depth,
        })
    }

    fn overlap_point_box(p: Vec2, c: Vec2, h: Vec2) -> bool {
        let min = c - h;
        let max = c + h;
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    fn overlap_point_circle(p: Vec2, c: Vec2, r: f32) -> bool {
        (p - c).length_squared() <= r * r
    }

    fn ray_aabb(origin: Vec2, dir: Vec2, aabb_min: Vec2, aabb_max: Vec2) -> Option<RayHit> {
        // Slab method with normal tracking; returns earliest t >= 0
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        let mut n_enter = Vec2::ZERO;

        for axis in 0..2 {
            let (o, d) = (origin[axis], dir[axis]);
            let (lo, hi) = (aabb_min[axis], aabb_max[axis]);
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t1 = (lo - o) * inv;
            let mut t2 = (hi - o) * inv;
            let mut n = -1.0;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
                n = 1.0;
            }
            if t1 > tmin {
                tmin = t1;
                n_enter = if axis == 0 {
                    Vec2::new(n, 0.0)
                } else {
                    Vec2::new(0.0, n)
                };
            }
            tmax = tmax.min(t2);
            if tmin > tmax {
                return None;
            }
        }

        if tmax < 0.0 {
            return None;
        }
        // If origin inside, tmin < 0; treat as immediate hit
        if tmin < 0.0 {
            return Some(RayHit {
                toi: 0.0,
                normal: Vec2::ZERO,
                point: origin,
            });
        }
        Some(RayHit {
            toi: tmin,
            normal: n_enter,
            point: origin + dir * tmin,
        })
    }

    fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, r: f32) -> Option<RayHit> {
        // Solve ||origin + t*dir - center||^2 = r^2 for t >= 0
        let m = origin - center;
        let a = dir.length_squared();
        if a == 0.0 {
            return None;
        }
        let c = m.length_squared() - r * r;
        if c <= 0.0 {
            return Some(RayHit {
                toi: 0.0,
                normal: Vec2::ZERO,
                point: origin,
            });
        }
        let b = 2.0 * m.dot(dir);
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let t = (-b - disc.sqrt()) / (2.0 * a);
        if t < 0.0 {
            return None;
        }
        let point = origin + dir * t;
        let normal = (point - center).normalize_or_zero();
        Some(RayHit {
            toi: t,
            normal,
            point,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const UNIT: Vec2 = Vec2::ONE;

    #[test]
    fn test_circle_circle_depth_and_normal() {
        let c = Narrowphase::circle_circle(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0).unwrap();
        assert_abs_diff_eq!(c.depth, 5.0, epsilon = 1e-5);
        // A toward B
        assert_eq!(c.normal, Vec2::X);
        assert_eq!(c.point, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_circle_circle_separated_and_tangent() {
        assert!(Narrowphase::circle_circle(Vec2::ZERO, 1.0, Vec2::new(2.5, 0.0), 1.0).is_none());
        assert!(Narrowphase::circle_circle(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_circle_circle_coincident_defaults_to_x() {
        let c = Narrowphase::circle_circle(UNIT, 1.0, UNIT, 2.0).unwrap();
        assert_eq!(c.normal, Vec2::X);
        assert_eq!(c.depth, 3.0);
    }

    #[test]
    fn test_circle_box_outside() {
        let half = Vec2::new(20.0, 10.0);
        // circle above a box (y down): normal points down toward the box
        let c = Narrowphase::circle_box(Vec2::new(0.0, -14.0), 5.0, Vec2::ZERO, half).unwrap();
        assert_abs_diff_eq!(c.depth, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.normal.y, 1.0, epsilon = 1e-6);
        assert_eq!(c.point, Vec2::new(0.0, -10.0));
        assert!(Narrowphase::circle_box(Vec2::new(0.0, -16.0), 5.0, Vec2::ZERO, half).is_none());
    }

    #[test]
    fn test_circle_box_center_inside_picks_nearest_face() {
        let half = Vec2::new(10.0, 5.0);
        let c = Narrowphase::circle_box(Vec2::new(8.0, 0.0), 1.0, Vec2::ZERO, half).unwrap();
        // nearest face is +x; circle leaves along +x so the A->B normal is -x
        assert_eq!(c.normal, Vec2::new(-1.0, 0.0));
        assert_abs_diff_eq!(c.depth, 3.0, epsilon = 1e-6);

        let c = Narrowphase::circle_box(Vec2::new(0.0, -4.0), 1.0, Vec2::ZERO, half).unwrap();
        assert_eq!(c.normal, Vec2::new(0.0, 1.0));
        assert_abs_diff_eq!(c.depth, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_box_circle_is_flipped() {
        let circle = Collider::circle(5.0);
        let boxed = Collider::rect(20.0, 10.0);
        let above = Vec2::new(0.0, -14.0);
        let tie = AxisPreference::X;
        let c = Narrowphase::collide(&boxed, Vec2::ZERO, &circle, above, tie).unwrap();
        assert_abs_diff_eq!(c.normal.y, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.depth, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_box_box_min_axis() {
        let tie = AxisPreference::X;
        let c = Narrowphase::box_box(Vec2::ZERO, UNIT, Vec2::new(1.5, 0.2), UNIT, tie).unwrap();
        assert_eq!(c.normal, Vec2::X);
        assert_abs_diff_eq!(c.depth, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(c.point.x, 0.75, epsilon = 1e-6);

        let c = Narrowphase::box_box(Vec2::ZERO, UNIT, Vec2::new(0.1, -1.5), UNIT, tie).unwrap();
        assert_eq!(c.normal, Vec2::new(0.0, -1.0));
        assert!(Narrowphase::box_box(Vec2::ZERO, UNIT, Vec2::new(3.1, 0.0), UNIT, tie).is_none());
    }

    #[test]
    fn test_box_box_tie_break_policy() {
        let cb = Vec2::new(1.0, 1.0);
        let x = Narrowphase::box_box(Vec2::ZERO, UNIT, cb, UNIT, AxisPreference::X).unwrap();
        assert_eq!(x.normal, Vec2::X);
        let y = Narrowphase::box_box(Vec2::ZERO, UNIT, cb, UNIT, AxisPreference::Y).unwrap();
        assert_eq!(y.normal, Vec2::Y);
    }

    #[test]
    fn test_polygon_pairs_have_no_detector() {
        let poly = Collider::polygon(vec![Vec2::ZERO, Vec2::X, Vec2::Y]);
        let circle = Collider::circle(1.0);
        let tie = AxisPreference::X;
        assert!(Narrowphase::collide(&poly, Vec2::ZERO, &circle, Vec2::ZERO, tie).is_none());
        assert!(Narrowphase::collide(&poly, Vec2::ZERO, &poly, Vec2::ZERO, tie).is_none());
    }

    #[test]
    fn test_point_overlaps() {
        let half = Vec2::new(1.0, 2.0);
        let c = Vec2::new(1.0, -1.0);
        assert!(Narrowphase::overlap_point_box(Vec2::new(1.0, 2.0), Vec2::ZERO, half));
        assert!(!Narrowphase::overlap_point_box(Vec2::new(1.1, 0.0), Vec2::ZERO, half));
        assert!(Narrowphase::overlap_point_circle(Vec2::new(3.0, -1.0), c, 2.0));
        assert!(!Narrowphase::overlap_point_circle(Vec2::new(3.1, -1.0), c, 2.0));
    }

    // --- Rays ----------------------------------------------------------------

    #[test]
    fn test_ray_aabb_hit() {
        let hit = Narrowphase::ray_aabb(Vec2::new(-5.0, 0.0), Vec2::X, -UNIT, UNIT).unwrap();
        assert_abs_diff_eq!(hit.toi, 4.0, epsilon = 1e-6);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert_abs_diff_eq!(hit.point.x, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ray_aabb_top_face_normal() {
        let hit = Narrowphase::ray_aabb(
            Vec2::new(0.0, -100.0),
            Vec2::Y,
            Vec2::new(-50.0, -10.0),
            Vec2::new(50.0, 10.0),
        )
        .unwrap();
        assert_abs_diff_eq!(hit.toi, 90.0, epsilon = 1e-4);
        assert_eq!(hit.normal, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_ray_aabb_misses() {
        // parallel outside the slab
        assert!(Narrowphase::ray_aabb(Vec2::new(-5.0, 2.0), Vec2::X, -UNIT, UNIT).is_none());
        // box behind the origin
        assert!(Narrowphase::ray_aabb(Vec2::new(5.0, 0.0), Vec2::X, -UNIT, UNIT).is_none());
    }

    #[test]
    fn test_ray_aabb_origin_inside() {
        let hit = Narrowphase::ray_aabb(Vec2::ZERO, Vec2::X, -UNIT, UNIT).unwrap();
        assert_eq!(hit.toi, 0.0);
        assert_eq!(hit.normal, Vec2::ZERO);
    }

    #[test]
    fn test_ray_circle() {
        let hit = Narrowphase::ray_circle(Vec2::new(-3.0, 0.0), Vec2::X, Vec2::ZERO, 1.0).unwrap();
        assert_abs_diff_eq!(hit.toi, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hit.normal.x, -1.0, epsilon = 1e-5);
        assert!(Narrowphase::ray_circle(Vec2::new(-3.0, 2.0), Vec2::X, Vec2::ZERO, 1.0).is_none());
        assert!(Narrowphase::ray_circle(Vec2::new(3.0, 0.0), Vec2::X, Vec2::ZERO, 1.0).is_none());

        let inside = Narrowphase::ray_circle(Vec2::ZERO, Vec2::X, Vec2::ZERO, 1.0).unwrap();
        assert_eq!(inside.toi, 0.0);
    }
}
