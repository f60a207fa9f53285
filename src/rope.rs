//! Position-based Verlet rope, independent of the rigid-body world.

use glam::Vec2;

use crate::error::PhysicsError;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RopePoint {
    pub position: Vec2,
    /// Position at the previous step; velocity is implicit.
    pub previous: Vec2,
    pub pinned: bool,
}

/// Chain of points joined by fixed-length segments.
#[derive(Clone, Debug)]
pub struct VerletRope {
    points: Vec<RopePoint>,
    segment_length: f32,
    pub gravity: Vec2,
    /// Fraction of implicit velocity kept per step.
    pub damping: f32,
    /// Segment relaxation passes per step.
    pub iterations: usize,
}

impl VerletRope {
    /// Straight rope from `start` to `end` split into `segments` pieces.
    /// The first point starts pinned.
    pub fn new(start: Vec2, end: Vec2, segments: usize) -> Result<Self, PhysicsError> {
        if segments == 0 {
            return Err(PhysicsError::EmptyRope);
        }
        let points = (0..=segments)
            .map(|i| {
                let p = start.lerp(end, i as f32 / segments as f32);
                RopePoint {
                    position: p,
                    previous: p,
                    pinned: i == 0,
                }
            })
            .collect();
        Ok(Self {
            points,
            segment_length: start.distance(end) / segments as f32,
            gravity: Vec2::new(0.0, 980.0),
            damping: 0.99,
            iterations: 10,
        })
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    fn check(&self, index: usize) -> Result<(), PhysicsError> {
        if index < self.points.len() {
            Ok(())
        } else {
            Err(PhysicsError::RopePointOutOfRange { index, len: self.points.len() })
        }
    }

    /// Fix a point at `position`.
    pub fn pin(&mut self, index: usize, position: Vec2) -> Result<(), PhysicsError> {
        self.check(index)?;
        let p = &mut self.points[index];
        p.position = position;
        p.previous = position;
        p.pinned = true;
        Ok(())
    }

    pub fn unpin(&mut self, index: usize) -> Result<(), PhysicsError> {
        self.check(index)?;
        self.points[index].pinned = false;
        Ok(())
    }

    /// Teleport a point without giving it velocity.
    pub fn set_point(&mut self, index: usize, position: Vec2) -> Result<(), PhysicsError> {
        self.check(index)?;
        let p = &mut self.points[index];
        p.position = position;
        p.previous = position;
        Ok(())
    }

    pub fn points(&self) -> &[RopePoint] {
        &self.points
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().map(|p| p.position)
    }

    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    pub fn rest_length(&self) -> f32 {
        self.segment_length * (self.points.len() - 1) as f32
    }

    /// Current polyline length.
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|w| w[0].position.distance(w[1].position))
            .sum()
    }

    /// Verlet integration followed by segment relaxation. Non-positive `dt` is a no-op.
    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        let accel = self.gravity * dt * dt;
        for p in self.points.iter_mut().filter(|p| !p.pinned) {
            let velocity = (p.position - p.previous) * self.damping;
            p.previous = p.position;
            p.position += velocity + accel;
        }

        for _ in 0..self.iterations {
            for i in 0..self.points.len() - 1 {
                let (a, b) = (self.points[i], self.points[i + 1]);
                let delta = b.position - a.position;
                let dist = delta.length();
                if dist < crate::math::EPSILON {
                    continue;
                }
                let offset = delta * ((dist - self.segment_length) / dist);
                match (a.pinned, b.pinned) {
                    (true, true) => {}
                    (true, false) => self.points[i + 1].position -= offset,
                    (false, true) => self.points[i].position += offset,
                    (false, false) => {
                        self.points[i].position += offset * 0.5;
                        self.points[i + 1].position -= offset * 0.5;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_new_rope_layout() {
        let r = VerletRope::new(Vec2::ZERO, Vec2::new(100.0, 0.0), 10).unwrap();
        assert_eq!(r.points().len(), 11);
        assert_abs_diff_eq!(r.segment_length(), 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.rest_length(), 100.0, epsilon = 1e-4);
        assert!(r.points()[0].pinned);
        assert!(!r.points()[10].pinned);
        assert_eq!(VerletRope::new(Vec2::ZERO, Vec2::X, 0).unwrap_err(), PhysicsError::EmptyRope);
    }

    #[test]
    fn test_hanging_rope_keeps_length() {
        let mut r = VerletRope::new(Vec2::ZERO, Vec2::new(100.0, 0.0), 10)
            .unwrap()
            .with_iterations(40);
        for _ in 0..600 {
            r.step(1.0 / 60.0);
        }
        // pinned end stays put, free end swings below it
        assert_eq!(r.points()[0].position, Vec2::ZERO);
        let tip = r.points()[10].position;
        assert!(tip.y > 50.0);
        assert!(r.length() < r.rest_length() * 1.05);
    }

    #[test]
    fn test_pin_both_ends_sags_between() {
        let mut r = VerletRope::new(Vec2::ZERO, Vec2::new(100.0, 0.0), 10).unwrap();
        r.pin(10, Vec2::new(80.0, 0.0)).unwrap();
        for _ in 0..300 {
            r.step(1.0 / 60.0);
        }
        assert_eq!(r.points()[10].position, Vec2::new(80.0, 0.0));
        assert!(r.points()[5].position.y > 10.0);
    }

    #[test]
    fn test_index_errors_and_noop_step() {
        let mut r = VerletRope::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 2).unwrap();
        assert_eq!(
            r.pin(3, Vec2::ZERO),
            Err(PhysicsError::RopePointOutOfRange { index: 3, len: 3 })
        );
        assert!(r.unpin(9).is_err());
        let before: Vec<Vec2> = r.positions().collect();
        r.step(0.0);
        r.step(-1.0);
        assert_eq!(r.positions().collect::<Vec<_>>(), before);

        r.set_point(2, Vec2::new(0.0, 10.0)).unwrap();
        assert_eq!(r.points()[2].previous, Vec2::new(0.0, 10.0));
        r.unpin(0).unwrap();
        assert!(!r.points()[0].pinned);
    }
}
