//! Damped springs for smoothing scalar and 2D values toward a target
//! (camera follow, UI juice). Semi-implicit Euler.

use glam::Vec2;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spring1D {
    value: f32,
    velocity: f32,
    target: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl Spring1D {
    /// Spring at rest on `initial`.
    pub fn new(initial: f32, stiffness: f32, damping: f32) -> Self {
        Self {
            value: initial,
            velocity: 0.0,
            target: initial,
            stiffness,
            damping,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to `value` and stop.
    pub fn snap_to(&mut self, value: f32) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
    }

    pub fn update(&mut self, dt: f32) -> f32 {
        if dt > 0.0 {
            let force = -self.stiffness * (self.value - self.target) - self.damping * self.velocity;
            self.velocity += force * dt;
            self.value += self.velocity * dt;
        }
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self, epsilon: f32) -> bool {
        (self.value - self.target).abs() < epsilon && self.velocity.abs() < epsilon
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spring2D {
    value: Vec2,
    velocity: Vec2,
    target: Vec2,
    pub stiffness: f32,
    pub damping: f32,
}

impl Spring2D {
    pub fn new(initial: Vec2, stiffness: f32, damping: f32) -> Self {
        Self {
            value: initial,
            velocity: Vec2::ZERO,
            target: initial,
            stiffness,
            damping,
        }
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn snap_to(&mut self, value: Vec2) {
        self.value = value;
        self.target = value;
        self.velocity = Vec2::ZERO;
    }

    pub fn update(&mut self, dt: f32) -> Vec2 {
        if dt > 0.0 {
            let force = (self.target - self.value) * self.stiffness - self.velocity * self.damping;
            self.velocity += force * dt;
            self.value += self.velocity * dt;
        }
        self.value
    }

    pub fn value(&self) -> Vec2 {
        self.value
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn is_settled(&self, epsilon: f32) -> bool {
        self.value.distance(self.target) < epsilon && self.velocity.length() < epsilon
    }
}
