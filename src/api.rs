use glam::Vec2;

use crate::body::{BodyDesc, RigidBody};
use crate::constraint::Constraint;
use crate::math::Aabb;
use crate::shape::Material;
use crate::types::*;

/// Public API contract for the stepping physics world.
pub trait PhysicsWorldApi<U> {
    /// Construct a new world with the given configuration. Invalid fields
    /// fall back to their defaults.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Bodies ------------------------------------------------------------

    /// Insert a body built from a full config and return its handle.
    fn add_body(&mut self, desc: BodyDesc<U>) -> BodyHandle;

    /// Remove a body (and every constraint attached to it).
    fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody<U>>;

    /// Convenience: dynamic circle.
    fn create_circle_body(
        &mut self,
        position: Vec2,
        radius: f32,
        material: Material,
    ) -> BodyHandle
    where
        U: Default;

    /// Convenience: dynamic axis-aligned box.
    fn create_box_body(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        material: Material,
    ) -> BodyHandle
    where
        U: Default;

    /// Convenience: immovable axis-aligned box.
    fn create_static_box(&mut self, position: Vec2, half_extents: Vec2) -> BodyHandle
    where
        U: Default;

    /// Convenience: immovable circle.
    fn create_static_circle(&mut self, position: Vec2, radius: f32) -> BodyHandle
    where
        U: Default;

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody<U>>;

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody<U>>;

    // --- Constraints -------------------------------------------------------

    fn add_constraint(&mut self, constraint: Constraint) -> ConstraintHandle;

    fn remove_constraint(&mut self, handle: ConstraintHandle) -> Option<Constraint>;

    // --- Simulation --------------------------------------------------------

    /// Advance by `dt` seconds (clamped to `max_dt`). Non-positive `dt` is a no-op.
    fn step(&mut self, dt: f32);

    /// Drop every body and constraint. Listeners stay registered.
    fn clear(&mut self);

    // --- Queries -----------------------------------------------------------

    /// Closest hit within `[0, max_distance]` along `direction`.
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: Option<&dyn Fn(BodyHandle, &RigidBody<U>) -> bool>,
    ) -> Option<RaycastHit>;

    /// Bodies whose bounds overlap `aabb`.
    fn query_aabb(&self, aabb: &Aabb) -> Vec<BodyHandle>;

    /// Bodies whose shape contains `point`.
    fn query_point(&self, point: Vec2) -> Vec<BodyHandle>;

    /// Bodies whose shape overlaps the circle.
    fn query_circle(&self, center: Vec2, radius: f32) -> Vec<BodyHandle>;

    // --- Events ------------------------------------------------------------

    /// Called for every non-sensor contact found during `step`.
    fn on_collision_start<F>(&mut self, listener: F)
    where
        F: FnMut(&mut Self, &CollisionEvent) + 'static;

    /// Called for every contact involving a sensor during `step`.
    fn on_sensor_trigger<F>(&mut self, listener: F)
    where
        F: FnMut(&mut Self, &CollisionEvent) + 'static;
}

/// Narrowphase and primitive intersection signatures.
///
/// Overlap tests return a single contact whose normal points from the first
/// shape toward the second.
pub trait NarrowphaseApi {
    // Overlaps --------------------------------------------------------------

    fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Contact>;
    fn circle_box(c: Vec2, r: f32, box_c: Vec2, box_h: Vec2) -> Option<Contact>;
    fn box_box(ca: Vec2, ha: Vec2, cb: Vec2, hb: Vec2, tie: AxisPreference) -> Option<Contact>;
    fn overlap_point_box(p: Vec2, c: Vec2, h: Vec2) -> bool;
    fn overlap_point_circle(p: Vec2, c: Vec2, r: f32) -> bool;

    // Rays (unit direction) -------------------------------------------------

    fn ray_aabb(origin: Vec2, dir: Vec2, aabb_min: Vec2, aabb_max: Vec2) -> Option<RayHit>;
    fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, r: f32) -> Option<RayHit>;
}
