use glam::Vec2;
use smallvec::SmallVec;

use crate::error::PhysicsError;

slotmap::new_key_type! {
    /// Stable handle to a body owned by a `PhysicsWorld`. Invalidated on removal.
    pub struct BodyHandle;
    /// Stable handle to a constraint owned by a `PhysicsWorld`.
    pub struct ConstraintHandle;
}

/// Bitmask-based collision filtering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionFilter {
    /// Group bit(s) this body belongs to.
    pub group: u32,
    /// Groups this body is willing to touch.
    pub mask: u32,
}

impl CollisionFilter {
    pub fn new(group: u32, mask: u32) -> Self {
        Self { group, mask }
    }

    /// Mutual consent: each side's group must be in the other's mask.
    pub fn interacts(self, other: CollisionFilter) -> bool {
        (self.group & other.mask) != 0 && (other.group & self.mask) != 0
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            group: 1,
            mask: u32::MAX,
        }
    }
}

/// Which axis wins when a box-vs-box test sees equal overlap on both axes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisPreference {
    #[default]
    X,
    Y,
}

/// One contact point from a narrow-phase test.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    pub point: Vec2,
    /// Unit normal pointing from body A toward body B.
    pub normal: Vec2,
    /// Penetration depth (>= 0).
    pub depth: f32,
}

impl Contact {
    /// Same contact seen from the other body.
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Transient result of a narrow-phase hit between two bodies; lives for one step.
#[derive(Clone, Debug)]
pub struct Manifold {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub contacts: SmallVec<[Contact; 2]>,
    /// Aggregate normal, A toward B.
    pub normal: Vec2,
    /// Aggregate (deepest) penetration.
    pub depth: f32,
}

impl Manifold {
    pub fn from_contact(body_a: BodyHandle, body_b: BodyHandle, contact: Contact) -> Self {
        Self {
            body_a,
            body_b,
            contacts: smallvec::smallvec![contact],
            normal: contact.normal,
            depth: contact.depth,
        }
    }
}

/// Payload handed to collision and sensor listeners.
#[derive(Clone, Debug)]
pub struct CollisionEvent {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub manifold: Manifold,
}

/// Primitive ray hit in ray-parameter space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// Distance along the (unit) direction.
    pub toi: f32,
    /// Surface normal at the hit (zero when the origin starts inside).
    pub normal: Vec2,
    pub point: Vec2,
}

/// Closest body hit by `PhysicsWorld::raycast`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastHit {
    pub body: BodyHandle,
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// World-level configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    /// Acceleration applied to every body (scaled per body). Y points down.
    pub gravity: Vec2,
    /// Spatial hash cell size in world units.
    pub cell_size: f32,
    /// Velocity and constraint solver passes per step.
    pub iterations: usize,
    /// Penetration left uncorrected to avoid jitter.
    pub slop: f32,
    /// Fraction of the remaining penetration removed per step, in (0, 1].
    pub correction_percent: f32,
    /// Upper clamp for `step(dt)`.
    pub max_dt: f32,
    pub enable_sleep: bool,
    /// `|v| + |w|` below which a body accumulates sleep time.
    pub sleep_velocity_threshold: f32,
    /// Seconds of low motion before a body falls asleep.
    pub sleep_time_threshold: f32,
    pub box_tie_break: AxisPreference,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 980.0),
            cell_size: 64.0,
            iterations: 8,
            slop: 0.01,
            correction_percent: 0.4,
            max_dt: 1.0 / 30.0,
            enable_sleep: true,
            sleep_velocity_threshold: 0.5,
            sleep_time_threshold: 0.5,
            box_tie_break: AxisPreference::X,
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    /// Check every numeric field; reports the first invalid one.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let invalid = |field, value, reason| {
            Err(PhysicsError::InvalidConfig {
                field,
                value,
                reason,
            })
        };
        if !self.gravity.is_finite() {
            return invalid("gravity", f32::NAN, "must be finite");
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return invalid("cell_size", self.cell_size, "must be positive");
        }
        if self.iterations == 0 {
            return invalid("iterations", 0.0, "must be at least 1");
        }
        if !(self.slop.is_finite() && self.slop >= 0.0) {
            return invalid("slop", self.slop, "must be non-negative");
        }
        if !(self.correction_percent > 0.0 && self.correction_percent <= 1.0) {
            return invalid(
                "correction_percent",
                self.correction_percent,
                "must be in (0, 1]",
            );
        }
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            return invalid("max_dt", self.max_dt, "must be positive");
        }
        let v = self.sleep_velocity_threshold;
        if !(v.is_finite() && v >= 0.0) {
            return invalid("sleep_velocity_threshold", v, "must be non-negative");
        }
        let t = self.sleep_time_threshold;
        if !(t.is_finite() && t >= 0.0) {
            return invalid("sleep_time_threshold", t, "must be non-negative");
        }
        Ok(())
    }

    /// Copy with every invalid field replaced by its default, logging each
    /// replacement.
    pub fn sanitized(mut self) -> Self {
        let d = WorldConfig::default();
        while let Err(err) = self.validate() {
            tracing::warn!(%err, "falling back to default");
            let PhysicsError::InvalidConfig { field, .. } = err else {
                break;
            };
            match field {
                "gravity" => self.gravity = d.gravity,
                "cell_size" => self.cell_size = d.cell_size,
                "iterations" => self.iterations = d.iterations,
                "slop" => self.slop = d.slop,
                "correction_percent" => self.correction_percent = d.correction_percent,
                "max_dt" => self.max_dt = d.max_dt,
                "sleep_velocity_threshold" => {
                    self.sleep_velocity_threshold = d.sleep_velocity_threshold
                }
                "sleep_time_threshold" => self.sleep_time_threshold = d.sleep_time_threshold,
                _ => break,
            }
        }
        self
    }
}

/// Debug/performance statistics for the last step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub bodies: usize,
    pub awake_bodies: usize,
    pub cells: usize,
    /// Sum of per-cell pair counts (n*(n-1)/2), counts duplicates across cells.
    pub candidate_pairs: usize,
    /// Unique pairs that survived deduplication and the exact AABB test.
    pub unique_pairs: usize,
    pub manifolds: usize,
    pub sensor_contacts: usize,
}

/// Timing breakdown for the last completed step.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub step_ms: f64,
    pub integrate_ms: f64,
    pub broad_phase_ms: f64,
    pub narrow_phase_ms: f64,
    pub solve_ms: f64,
    pub constraints_ms: f64,
    pub positions_ms: f64,
}
