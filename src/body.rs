use glam::Vec2;

use crate::math::{cross, cross_sv, Aabb, Vec2Ext};
use crate::shape::{Collider, Material};
use crate::types::CollisionFilter;

/// Full construction config for a `RigidBody`.
#[derive(Clone, Debug)]
pub struct BodyDesc<U = ()> {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub collider: Collider,
    pub material: Material,
    pub is_static: bool,
    pub is_sensor: bool,
    pub fixed_rotation: bool,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub filter: CollisionFilter,
    pub tag: Option<String>,
    pub user_data: U,
}

impl<U: Default> BodyDesc<U> {
    pub fn new(collider: Collider) -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            collider,
            material: Material::DEFAULT,
            is_static: false,
            is_sensor: false,
            fixed_rotation: false,
            gravity_scale: 1.0,
            linear_damping: 0.01,
            angular_damping: 0.01,
            filter: CollisionFilter::default(),
            tag: None,
            user_data: U::default(),
        }
    }
}

impl<U> BodyDesc<U> {
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn static_body(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    pub fn fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Per-step multiplicative damping factors, clamped to [0, 1].
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear.clamp(0.0, 1.0);
        self.angular_damping = angular.clamp(0.0, 1.0);
        self
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Swap the payload type.
    pub fn with_user_data<V>(self, user_data: V) -> BodyDesc<V> {
        BodyDesc {
            position: self.position,
            angle: self.angle,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            collider: self.collider,
            material: self.material,
            is_static: self.is_static,
            is_sensor: self.is_sensor,
            fixed_rotation: self.fixed_rotation,
            gravity_scale: self.gravity_scale,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            filter: self.filter,
            tag: self.tag,
            user_data,
        }
    }
}

/// A simulated body. Mass terms are derived from the collider and material
/// and are all zero for static bodies.
///
/// Pose fields are public for reading; writes should go through the setters
/// so the cached bounds and sleep state stay in sync.
#[derive(Clone, Debug)]
pub struct RigidBody<U = ()> {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub material: Material,
    pub is_sensor: bool,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub filter: CollisionFilter,
    pub tag: Option<String>,
    pub user_data: U,

    force: Vec2,
    torque: f32,
    collider: Collider,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    is_static: bool,
    fixed_rotation: bool,
    sleeping: bool,
    sleep_timer: f32,
    aabb: Aabb,
}

impl<U> RigidBody<U> {
    pub fn new(desc: BodyDesc<U>) -> Self {
        let (velocity, angular_velocity) = if desc.is_static {
            (Vec2::ZERO, 0.0)
        } else {
            (desc.velocity, desc.angular_velocity)
        };
        let mut body = Self {
            position: desc.position,
            velocity,
            angle: desc.angle,
            angular_velocity,
            material: desc.material,
            is_sensor: desc.is_sensor,
            gravity_scale: desc.gravity_scale,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            filter: desc.filter,
            tag: desc.tag,
            user_data: desc.user_data,
            force: Vec2::ZERO,
            torque: 0.0,
            collider: desc.collider,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            is_static: desc.is_static,
            fixed_rotation: desc.fixed_rotation,
            sleeping: false,
            sleep_timer: 0.0,
            aabb: Aabb::default(),
        };
        body.update_mass();
        body.update_aabb();
        body
    }

    fn update_mass(&mut self) {
        if self.is_static {
            self.mass = 0.0;
            self.inv_mass = 0.0;
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
            return;
        }
        let mp = self.collider.mass_properties(self.material.density);
        self.mass = mp.mass;
        self.inv_mass = if mp.mass > 0.0 { 1.0 / mp.mass } else { 0.0 };
        self.inertia = mp.inertia;
        self.inv_inertia = if mp.inertia > 0.0 && !self.fixed_rotation {
            1.0 / mp.inertia
        } else {
            0.0
        };
    }

    /// Rebuild the cached bounds from the current pose.
    pub fn update_aabb(&mut self) {
        self.aabb = self.collider.bounds(self.position, self.angle);
    }

    // --- Forces and impulses -----------------------------------------------

    /// Accumulate a force for the next step. Cleared after integration.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
        self.wake();
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
        self.wake();
    }

    /// Instant velocity change. With a world-space `contact` point the
    /// impulse also spins the body.
    pub fn apply_impulse(&mut self, impulse: Vec2, contact: Option<Vec2>) {
        self.velocity += impulse * self.inv_mass;
        if let Some(point) = contact {
            if !self.fixed_rotation {
                let r = point - self.position;
                self.angular_velocity += cross(r, impulse) * self.inv_inertia;
            }
        }
    }

    // --- Direct setters ----------------------------------------------------

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.update_aabb();
        self.wake();
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.update_aabb();
        self.wake();
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
        self.wake();
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
        self.wake();
    }

    pub fn wake(&mut self) {
        self.sleeping = false;
        self.sleep_timer = 0.0;
    }

    /// Wake only a sleeping body; an awake body keeps its sleep timer.
    pub(crate) fn wake_if_sleeping(&mut self) {
        if self.sleeping {
            self.wake();
        }
    }

    /// Put the body to sleep immediately, dropping its velocities.
    pub fn sleep(&mut self) {
        if self.is_static {
            return;
        }
        self.sleeping = true;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
    }

    // --- Frames --------------------------------------------------------------

    pub fn get_world_point(&self, local: Vec2) -> Vec2 {
        self.position + local.rotated(self.angle)
    }

    pub fn get_local_point(&self, world: Vec2) -> Vec2 {
        (world - self.position).rotated(-self.angle)
    }

    /// Linear plus angular contribution at a world-space point.
    pub fn velocity_at_point(&self, point: Vec2) -> Vec2 {
        self.velocity + cross_sv(self.angular_velocity, point - self.position)
    }

    // --- Accessors -----------------------------------------------------------

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn has_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    pub fn sleeping(&self) -> bool {
        self.sleeping
    }

    /// Dynamic and awake.
    pub fn is_active(&self) -> bool {
        !self.is_static && !self.sleeping
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    /// World-space collider center.
    pub fn collider_center(&self) -> Vec2 {
        self.collider.world_center(self.position, self.angle)
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn torque(&self) -> f32 {
        self.torque
    }

    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    // --- Stepping (driven by the world) --------------------------------------

    pub(crate) fn integrate_forces(&mut self, gravity: Vec2, dt: f32) {
        self.velocity += (gravity * self.gravity_scale + self.force * self.inv_mass) * dt;
        self.angular_velocity += self.torque * self.inv_inertia * dt;
        self.velocity *= 1.0 - self.linear_damping;
        self.angular_velocity *= 1.0 - self.angular_damping;
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    pub(crate) fn integrate_position(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
        self.update_aabb();
    }

    /// Advance the sleep timer; returns true when the body just fell asleep.
    pub(crate) fn update_sleep(
        &mut self,
        dt: f32,
        velocity_threshold: f32,
        time_threshold: f32,
    ) -> bool {
        let motion = self.velocity.length() + self.angular_velocity.abs();
        if motion < velocity_threshold {
            self.sleep_timer += dt;
            if self.sleep_timer > time_threshold {
                self.sleep();
                return true;
            }
        } else {
            self.sleep_timer = 0.0;
        }
        false
    }

    /// Move without waking, used by positional correction.
    pub(crate) fn nudge(&mut self, delta: Vec2) {
        self.position += delta;
        self.update_aabb();
    }
}
