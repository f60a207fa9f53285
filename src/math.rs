use glam::Vec2;

/// Threshold below which a length is treated as zero.
pub const EPSILON: f32 = 1e-6;

/// Scalar 2D cross product (z component of the 3D cross).
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Cross of a scalar (angular velocity around z) with a vector.
#[inline]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// Vector helpers glam does not provide, or whose degenerate cases the
/// collision code depends on.
pub trait Vec2Ext {
    /// Unit vector in the same direction, or zero for zero/non-finite input.
    fn safe_normalize(self) -> Vec2;
    /// Rotate counter-clockwise by `angle` radians.
    fn rotated(self, angle: f32) -> Vec2;
    /// Reflect about a (unit) normal.
    fn reflected(self, normal: Vec2) -> Vec2;
    /// Shorten to at most `max` length, keeping direction.
    fn clamped_length(self, max: f32) -> Vec2;
}

impl Vec2Ext for Vec2 {
    #[inline]
    fn safe_normalize(self) -> Vec2 {
        self.normalize_or_zero()
    }

    #[inline]
    fn rotated(self, angle: f32) -> Vec2 {
        if angle == 0.0 {
            return self;
        }
        Vec2::from_angle(angle).rotate(self)
    }

    #[inline]
    fn reflected(self, normal: Vec2) -> Vec2 {
        self - normal * (2.0 * self.dot(normal))
    }

    #[inline]
    fn clamped_length(self, max: f32) -> Vec2 {
        let len2 = self.length_squared();
        if max <= 0.0 {
            return Vec2::ZERO;
        }
        if len2 > max * max {
            self.safe_normalize() * max
        } else {
            self
        }
    }
}

/// Axis-aligned bounding box in world coordinates.
///
/// Always derived from a collider and a pose; bodies rebuild theirs after
/// every pose change.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from two corners; the corners are sorted per axis.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        let h = half_extents.abs();
        Self {
            min: center - h,
            max: center + h,
        }
    }

    /// Smallest box containing all `points`; `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut out = Self {
            min: first,
            max: first,
        };
        for p in it {
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        Some(out)
    }

    /// Inclusive on edges.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Inclusive: touching edges count as overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow uniformly by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Aabb {
        let m = Vec2::splat(margin);
        Aabb::new(self.min - m, self.max + m)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half extents.
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_safe_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.safe_normalize(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).safe_normalize();
        assert_abs_diff_eq!(n.x, 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(n.y, 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_cross_helpers() {
        assert_eq!(cross(Vec2::X, Vec2::Y), 1.0);
        assert_eq!(cross(Vec2::Y, Vec2::X), -1.0);
        // w x r for w = 2 around z at r = (1, 0) is (0, 2)
        assert_eq!(cross_sv(2.0, Vec2::X), Vec2::new(0.0, 2.0));
    }

    #[test]
    fn test_rotate_reflect_clamp() {
        let r = Vec2::X.rotated(std::f32::consts::FRAC_PI_2);
        assert_abs_diff_eq!(r.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-6);

        let v = Vec2::new(1.0, -1.0).reflected(Vec2::Y);
        assert_eq!(v, Vec2::new(1.0, 1.0));

        let c = Vec2::new(10.0, 0.0).clamped_length(2.0);
        assert_abs_diff_eq!(c.length(), 2.0, epsilon = 1e-6);
        assert_eq!(Vec2::new(1.0, 0.0).clamped_length(2.0), Vec2::X);
        assert_eq!(Vec2::new(1.0, 0.0).clamped_length(0.0), Vec2::ZERO);
    }

    #[test]
    fn test_aabb_queries() {
        let a = Aabb::from_center_half_extents(Vec2::ZERO, Vec2::splat(1.0));
        let b = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(3.0, 2.0));
        let c = Aabb::new(Vec2::new(1.5, 0.0), Vec2::new(3.0, 2.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains_point(Vec2::new(1.0, -1.0)));
        assert!(!a.contains_point(Vec2::new(1.01, 0.0)));

        let u = a.union(&c);
        assert_eq!(u.min, Vec2::new(-1.0, -1.0));
        assert_eq!(u.max, Vec2::new(3.0, 2.0));
        assert_eq!(a.expand(0.5).extents(), Vec2::splat(1.5));
        assert_eq!(c.center(), Vec2::new(2.25, 1.0));
        assert_eq!(c.size(), Vec2::new(1.5, 2.0));
    }

    #[test]
    fn test_aabb_from_points() {
        assert!(Aabb::from_points(std::iter::empty::<Vec2>()).is_none());
        let b = Aabb::from_points([Vec2::new(1.0, 5.0), Vec2::new(-2.0, 3.0)]).unwrap();
        assert_eq!(b.min, Vec2::new(-2.0, 3.0));
        assert_eq!(b.max, Vec2::new(1.0, 5.0));
    }
}
