use glam::Vec2;
use slotmap::SlotMap;

use crate::body::RigidBody;
use crate::math::EPSILON;
use crate::types::BodyHandle;

/// Spring-style joints. Solved as damped springs, not as rigid
/// constraints, so attached bodies may stretch and oscillate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Constraint {
    /// Keeps two body anchors (body-local) `length` apart.
    Distance {
        body_a: BodyHandle,
        anchor_a: Vec2,
        body_b: BodyHandle,
        anchor_b: Vec2,
        length: f32,
        stiffness: f32,
        damping: f32,
    },
    /// Pulls a body anchor toward a fixed world point.
    Pin {
        body: BodyHandle,
        anchor: Vec2,
        target: Vec2,
        stiffness: f32,
        damping: f32,
    },
}

/// Impulses below this do not wake sleeping bodies.
const WAKE_IMPULSE: f32 = 1e-6;

fn wakes(impulse: Vec2) -> bool {
    impulse.length_squared() > WAKE_IMPULSE * WAKE_IMPULSE
}

impl Constraint {
    /// Distance joint whose rest length is the current anchor separation.
    pub fn distance<U>(
        bodies: &SlotMap<BodyHandle, RigidBody<U>>,
        body_a: BodyHandle,
        anchor_a: Vec2,
        body_b: BodyHandle,
        anchor_b: Vec2,
        stiffness: f32,
        damping: f32,
    ) -> Option<Self> {
        let wa = bodies.get(body_a)?.get_world_point(anchor_a);
        let wb = bodies.get(body_b)?.get_world_point(anchor_b);
        Some(Constraint::Distance {
            body_a,
            anchor_a,
            body_b,
            anchor_b,
            length: wa.distance(wb),
            stiffness,
            damping,
        })
    }

    pub fn pin(body: BodyHandle, anchor: Vec2, target: Vec2, stiffness: f32, damping: f32) -> Self {
        Constraint::Pin {
            body,
            anchor,
            target,
            stiffness,
            damping,
        }
    }

    /// Bodies referenced by the constraint.
    pub fn body_handles(&self) -> impl Iterator<Item = BodyHandle> {
        let pair = match *self {
            Constraint::Distance { body_a, body_b, .. } => [Some(body_a), Some(body_b)],
            Constraint::Pin { body, .. } => [Some(body), None],
        };
        pair.into_iter().flatten()
    }

    /// True when the constraint references `handle`.
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.body_handles().any(|h| h == handle)
    }

    /// Apply one spring-damper impulse pass. Constraints pointing at
    /// removed bodies are ignored, and so are constraints whose bodies are
    /// all at rest: a sleeping body only wakes when something awake pulls it.
    pub fn solve<U>(&self, bodies: &mut SlotMap<BodyHandle, RigidBody<U>>, dt: f32) {
        match *self {
            Constraint::Distance {
                body_a,
                anchor_a,
                body_b,
                anchor_b,
                length,
                stiffness,
                damping,
            } => {
                let Some([a, b]) = bodies.get_disjoint_mut([body_a, body_b]) else {
                    return;
                };
                if !a.is_active() && !b.is_active() {
                    return;
                }
                let wa = a.get_world_point(anchor_a);
                let wb = b.get_world_point(anchor_b);
                let delta = wb - wa;
                let dist = delta.length();
                if dist < EPSILON {
                    return;
                }
                let n = delta / dist;
                let stretch = dist - length;
                let rel_vel = (b.velocity_at_point(wb) - a.velocity_at_point(wa)).dot(n);
                let force = stiffness * stretch + damping * rel_vel;
                let impulse = n * (force * dt);
                if wakes(impulse) {
                    a.wake_if_sleeping();
                    b.wake_if_sleeping();
                }
                a.apply_impulse(impulse, Some(wa));
                b.apply_impulse(-impulse, Some(wb));
            }
            Constraint::Pin {
                body,
                anchor,
                target,
                stiffness,
                damping,
            } => {
                let Some(b) = bodies.get_mut(body) else {
                    return;
                };
                if !b.is_active() {
                    return;
                }
                let wp = b.get_world_point(anchor);
                let delta = target - wp;
                let dist = delta.length();
                if dist < EPSILON {
                    return;
                }
                let n = delta / dist;
                let rel_vel = -b.velocity_at_point(wp).dot(n);
                let force = stiffness * dist + damping * rel_vel;
                let impulse = n * (force * dt);
                if wakes(impulse) {
                    b.wake_if_sleeping();
                }
                b.apply_impulse(impulse, Some(wp));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyDesc;
    use crate::shape::Collider;
    use approx::assert_abs_diff_eq;

    fn world_of(positions: &[Vec2]) -> (SlotMap<BodyHandle, RigidBody>, Vec<BodyHandle>) {
        let mut bodies = SlotMap::with_key();
        let handles = positions
            .iter()
            .map(|&p| {
                let desc = BodyDesc::new(Collider::circle(1.0)).with_position(p);
                bodies.insert(RigidBody::new(desc))
            })
            .collect();
        (bodies, handles)
    }

    #[test]
    fn test_distance_rest_length_from_current_pose() {
        let (bodies, h) = world_of(&[Vec2::ZERO, Vec2::new(30.0, 40.0)]);
        let o = Vec2::ZERO;
        let c = Constraint::distance(&bodies, h[0], o, h[1], o, 10.0, 0.0).unwrap();
        match c {
            Constraint::Distance { length, .. } => {
                assert_abs_diff_eq!(length, 50.0, epsilon = 1e-4)
            }
            _ => unreachable!(),
        }
        assert!(c.involves(h[0]) && c.involves(h[1]));
    }

    #[test]
    fn test_stretched_distance_pulls_together() {
        let (mut bodies, h) = world_of(&[Vec2::ZERO, Vec2::new(20.0, 0.0)]);
        let c = Constraint::Distance {
            body_a: h[0],
            anchor_a: Vec2::ZERO,
            body_b: h[1],
            anchor_b: Vec2::ZERO,
            length: 10.0,
            stiffness: 5.0,
            damping: 0.0,
        };
        c.solve(&mut bodies, 1.0 / 60.0);
        let (va, vb) = (bodies[h[0]].velocity, bodies[h[1]].velocity);
        assert!(va.x > 0.0);
        assert!(vb.x < 0.0);
        // equal masses get equal and opposite changes
        assert_abs_diff_eq!(va.x, -vb.x, epsilon = 1e-6);
    }

    #[test]
    fn test_pin_pulls_toward_target() {
        let (mut bodies, h) = world_of(&[Vec2::ZERO]);
        let c = Constraint::pin(h[0], Vec2::ZERO, Vec2::new(0.0, 10.0), 20.0, 1.0);
        c.solve(&mut bodies, 1.0 / 60.0);
        assert!(bodies[h[0]].velocity.y > 0.0);
        assert_eq!(bodies[h[0]].velocity.x, 0.0);
    }

    #[test]
    fn test_sleeping_pinned_body_stays_asleep() {
        let (mut bodies, h) = world_of(&[Vec2::ZERO]);
        bodies[h[0]].sleep();
        let c = Constraint::pin(h[0], Vec2::ZERO, Vec2::new(0.0, 10.0), 20.0, 1.0);
        c.solve(&mut bodies, 1.0 / 60.0);
        assert!(bodies[h[0]].sleeping());
        assert_eq!(bodies[h[0]].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_moving_partner_wakes_sleeping_body() {
        let (mut bodies, h) = world_of(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        let o = Vec2::ZERO;
        let c = Constraint::distance(&bodies, h[0], o, h[1], o, 5.0, 1.0).unwrap();
        bodies[h[0]].sleep();
        bodies[h[1]].sleep();
        c.solve(&mut bodies, 1.0 / 60.0);
        assert!(bodies[h[0]].sleeping() && bodies[h[1]].sleeping());

        bodies[h[1]].set_velocity(Vec2::new(30.0, 0.0));
        c.solve(&mut bodies, 1.0 / 60.0);
        assert!(!bodies[h[0]].sleeping());
        assert!(bodies[h[0]].velocity.x > 0.0);
    }

    #[test]
    fn test_constraint_keeps_awake_sleep_timer() {
        let (mut bodies, h) = world_of(&[Vec2::ZERO]);
        assert!(!bodies[h[0]].update_sleep(0.3, 0.5, 0.5));
        let c = Constraint::pin(h[0], Vec2::ZERO, Vec2::new(0.0, 10.0), 1.0, 0.0);
        c.solve(&mut bodies, 1.0 / 60.0);
        assert!(bodies[h[0]].velocity.y > 0.0);
        assert!(bodies[h[0]].update_sleep(0.3, 0.5, 0.5));
    }

    #[test]
    fn test_missing_body_is_ignored() {
        let (mut bodies, h) = world_of(&[Vec2::ZERO, Vec2::new(5.0, 0.0)]);
        bodies.remove(h[1]);
        let c = Constraint::Distance {
            body_a: h[0],
            anchor_a: Vec2::ZERO,
            body_b: h[1],
            anchor_b: Vec2::ZERO,
            length: 1.0,
            stiffness: 5.0,
            damping: 0.0,
        };
        c.solve(&mut bodies, 1.0 / 60.0);
        assert_eq!(bodies[h[0]].velocity, Vec2::ZERO);
        let gone = Constraint::distance(&bodies, h[0], Vec2::ZERO, h[1], Vec2::ZERO, 1.0, 0.0);
        assert!(gone.is_none());
    }
}
