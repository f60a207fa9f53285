use glam::Vec2;
use slotmap::SlotMap;
use tracing::{debug, trace};

use std::time::Instant;

use crate::api::{NarrowphaseApi, PhysicsWorldApi};
use crate::body::{BodyDesc, RigidBody};
use crate::constraint::Constraint;
use crate::grid::SpatialHash;
use crate::math::{Aabb, Vec2Ext};
use crate::narrowphase::Narrowphase;
use crate::shape::{Collider, Material, Shape};
use crate::solver;
use crate::types::*;

type Listener<U> = Box<dyn FnMut(&mut PhysicsWorld<U>, &CollisionEvent)>;

/// Owns every body and constraint and runs the per-frame pipeline.
pub struct PhysicsWorld<U = ()> {
    pub cfg: WorldConfig,
    pub step_counter: u64,

    bodies: SlotMap<BodyHandle, RigidBody<U>>,
    constraints: SlotMap<ConstraintHandle, Constraint>,

    // Rebuilt every step from fresh bounds
    grid: SpatialHash,

    collision_listeners: Vec<Listener<U>>,
    sensor_listeners: Vec<Listener<U>>,

    last_stats: WorldStats,
    // Timing for last step (optional)
    last_timing: Option<WorldTiming>,
}

/// Narrow-phase output in pair order, dispatched after the scan.
enum PendingEvent {
    Collision(CollisionEvent),
    Sensor(CollisionEvent),
}

fn elapsed_ms(t: Option<Instant>) -> f64 {
    t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
}

impl<U> PhysicsWorldApi<U> for PhysicsWorld<U> {
    fn new(cfg: WorldConfig) -> Self {
        let cfg = cfg.sanitized();
        Self {
            grid: SpatialHash::new(cfg.cell_size),
            cfg,
            step_counter: 0,
            bodies: SlotMap::with_key(),
            constraints: SlotMap::with_key(),
            collision_listeners: Vec::new(),
            sensor_listeners: Vec::new(),
            last_stats: WorldStats::default(),
            last_timing: None,
        }
    }

    fn add_body(&mut self, desc: BodyDesc<U>) -> BodyHandle {
        let handle = self.bodies.insert(RigidBody::new(desc));
        debug!(?handle, total = self.bodies.len(), "body added");
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody<U>> {
        let body = self.bodies.remove(handle)?;
        let before = self.constraints.len();
        self.constraints.retain(|_, c| !c.involves(handle));
        debug!(?handle, dropped_constraints = before - self.constraints.len(), "body removed");
        Some(body)
    }

    fn create_circle_body(
        &mut self,
        position: Vec2,
        radius: f32,
        material: Material,
    ) -> BodyHandle
    where
        U: Default,
    {
        let desc = BodyDesc::new(Collider::circle(radius))
            .with_position(position)
            .with_material(material);
        self.add_body(desc)
    }

    fn create_box_body(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        material: Material,
    ) -> BodyHandle
    where
        U: Default,
    {
        let collider = Collider::rect(half_extents.x, half_extents.y);
        let desc = BodyDesc::new(collider)
            .with_position(position)
            .with_material(material);
        self.add_body(desc)
    }

    fn create_static_box(&mut self, position: Vec2, half_extents: Vec2) -> BodyHandle
    where
        U: Default,
    {
        let collider = Collider::rect(half_extents.x, half_extents.y);
        let desc = BodyDesc::new(collider)
            .with_position(position)
            .static_body();
        self.add_body(desc)
    }

    fn create_static_circle(&mut self, position: Vec2, radius: f32) -> BodyHandle
    where
        U: Default,
    {
        let desc = BodyDesc::new(Collider::circle(radius))
            .with_position(position)
            .static_body();
        self.add_body(desc)
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody<U>> {
        self.bodies.get(handle)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody<U>> {
        self.bodies.get_mut(handle)
    }

    fn add_constraint(&mut self, constraint: Constraint) -> ConstraintHandle {
        let handle = self.constraints.insert(constraint);
        debug!(?handle, "constraint added");
        handle
    }

    fn remove_constraint(&mut self, handle: ConstraintHandle) -> Option<Constraint> {
        let c = self.constraints.remove(handle);
        if c.is_some() {
            debug!(?handle, "constraint removed");
        }
        c
    }

    fn step(&mut self, dt: f32) {
        // also rejects NaN
        if !(dt > 0.0) {
            return;
        }
        let dt = dt.min(self.cfg.max_dt);
        let timed = self.cfg.enable_timing;
        let now = || if timed { Some(Instant::now()) } else { None };
        let mut timing = WorldTiming::default();
        let t_all = now();

        let t = now();
        self.integrate_forces(dt);
        timing.integrate_ms = elapsed_ms(t);

        let t = now();
        let pairs = self.broad_phase();
        timing.broad_phase_ms = elapsed_ms(t);

        let t = now();
        let (manifolds, events) = self.narrow_phase(&pairs);
        self.dispatch(events);
        timing.narrow_phase_ms = elapsed_ms(t);

        let t = now();
        for _ in 0..self.cfg.iterations {
            for m in &manifolds {
                if let Some([a, b]) = self.bodies.get_disjoint_mut([m.body_a, m.body_b]) {
                    solver::resolve_velocity(a, b, m);
                }
            }
        }
        for m in &manifolds {
            if let Some([a, b]) = self.bodies.get_disjoint_mut([m.body_a, m.body_b]) {
                solver::correct_position(a, b, m, self.cfg.slop, self.cfg.correction_percent);
            }
        }
        timing.solve_ms = elapsed_ms(t);

        let t = now();
        self.solve_constraints(dt);
        timing.constraints_ms = elapsed_ms(t);

        let t = now();
        self.integrate_positions(dt);
        timing.positions_ms = elapsed_ms(t);

        self.step_counter = self.step_counter.wrapping_add(1);
        self.last_stats.manifolds = manifolds.len();
        self.last_stats.bodies = self.bodies.len();
        self.last_stats.awake_bodies = self.bodies.values().filter(|b| b.is_active()).count();
        trace!(
            step = self.step_counter,
            pairs = pairs.len(),
            manifolds = manifolds.len(),
            awake = self.last_stats.awake_bodies,
            "step"
        );

        if timed {
            timing.step_ms = elapsed_ms(t_all);
            self.last_timing = Some(timing);
        } else {
            self.last_timing = None;
        }
    }

    fn clear(&mut self) {
        debug!(
            bodies = self.bodies.len(),
            constraints = self.constraints.len(),
            "world cleared"
        );
        self.bodies.clear();
        self.constraints.clear();
        self.grid.clear();
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: Option<&dyn Fn(BodyHandle, &RigidBody<U>) -> bool>,
    ) -> Option<RaycastHit> {
        let dir = direction.safe_normalize();
        if dir == Vec2::ZERO || !(max_distance >= 0.0) {
            return None;
        }
        let mut best: Option<RaycastHit> = None;
        for (handle, body) in &self.bodies {
            if filter.is_some_and(|f| !f(handle, body)) {
                continue;
            }
            let center = body.collider_center();
            let hit = match &body.collider().shape {
                Shape::Circle { radius } => Narrowphase::ray_circle(origin, dir, center, *radius),
                Shape::Box { half_extents } => {
                    let (min, max) = (center - *half_extents, center + *half_extents);
                    Narrowphase::ray_aabb(origin, dir, min, max)
                }
                Shape::Polygon { .. } => None,
            };
            let Some(h) = hit else { continue };
            if h.toi < 0.0 || h.toi > max_distance {
                continue;
            }
            match &best {
                Some(bh) if h.toi >= bh.distance => {}
                _ => {
                    best = Some(RaycastHit {
                        body: handle,
                        point: h.point,
                        normal: h.normal,
                        distance: h.toi,
                    })
                }
            }
        }
        best
    }

    fn query_aabb(&self, aabb: &Aabb) -> Vec<BodyHandle> {
        self.bodies
            .iter()
            .filter(|(_, b)| b.aabb().overlaps(aabb))
            .map(|(h, _)| h)
            .collect()
    }

    fn query_point(&self, point: Vec2) -> Vec<BodyHandle> {
        self.bodies
            .iter()
            .filter(|(_, b)| b.aabb().contains_point(point))
            .filter(|(_, b)| b.collider().contains_point(b.position, b.angle, point))
            .map(|(h, _)| h)
            .collect()
    }

    fn query_circle(&self, center: Vec2, radius: f32) -> Vec<BodyHandle> {
        let bounds = Collider::circle(radius).bounds(center, 0.0);
        self.bodies
            .iter()
            .filter(|(_, b)| b.aabb().overlaps(&bounds))
            .filter(|(_, b)| match &b.collider().shape {
                Shape::Circle { radius: r } => {
                    Narrowphase::overlap_point_circle(b.collider_center(), center, radius + r)
                }
                Shape::Box { half_extents } => {
                    let c = b.collider_center();
                    let closest = center.clamp(c - *half_extents, c + *half_extents);
                    Narrowphase::overlap_point_circle(closest, center, radius)
                }
                // bounds overlap is the best we have without a polygon detector
                Shape::Polygon { .. } => true,
            })
            .map(|(h, _)| h)
            .collect()
    }

    fn on_collision_start<F>(&mut self, listener: F)
    where
        F: FnMut(&mut Self, &CollisionEvent) + 'static,
    {
        self.collision_listeners.push(Box::new(listener));
    }

    fn on_sensor_trigger<F>(&mut self, listener: F)
    where
        F: FnMut(&mut Self, &CollisionEvent) + 'static,
    {
        self.sensor_listeners.push(Box::new(listener));
    }
}

impl<U> PhysicsWorld<U> {
    /// Validating constructor; reports the first invalid config field.
    pub fn try_new(cfg: WorldConfig) -> Result<Self, crate::error::PhysicsError> {
        cfg.validate()?;
        Ok(<Self as PhysicsWorldApi<U>>::new(cfg))
    }

    pub fn gravity(&self) -> Vec2 {
        self.cfg.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.cfg.gravity = gravity;
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody<U>)> {
        self.bodies.iter()
    }

    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody<U>)> {
        self.bodies.iter_mut()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(handle)
    }

    /// Mutable access to a constraint; wakes the bodies it references.
    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut Constraint> {
        let c = self.constraints.get_mut(handle)?;
        for h in c.body_handles() {
            if let Some(body) = self.bodies.get_mut(h) {
                body.wake();
            }
        }
        Some(c)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Distance joint between two bodies, rest length taken from the current pose.
    pub fn add_distance_constraint(
        &mut self,
        body_a: BodyHandle,
        anchor_a: Vec2,
        body_b: BodyHandle,
        anchor_b: Vec2,
        stiffness: f32,
        damping: f32,
    ) -> Option<ConstraintHandle> {
        let c = Constraint::distance(
            &self.bodies,
            body_a,
            anchor_a,
            body_b,
            anchor_b,
            stiffness,
            damping,
        )?;
        Some(self.add_constraint(c))
    }

    /// Return debug/perf stats for the last step.
    pub fn debug_stats(&self) -> WorldStats {
        self.last_stats
    }

    /// Return timing breakdown for the last `step` (when enabled).
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }

    // --- Pipeline stages -----------------------------------------------------

    fn integrate_forces(&mut self, dt: f32) {
        let gravity = self.cfg.gravity;
        for body in self.bodies.values_mut().filter(|b| b.is_active()) {
            body.integrate_forces(gravity, dt);
        }
    }

    fn broad_phase(&mut self) -> Vec<(BodyHandle, BodyHandle)> {
        // `cfg` is public; pick up cell size edits made between steps
        let cell_size = self.cfg.cell_size;
        if cell_size.is_finite() && cell_size > 0.0 && cell_size != self.grid.cell_size() {
            debug!(from = self.grid.cell_size(), to = cell_size, "grid resized");
            self.grid.set_cell_size(cell_size);
        }
        self.grid.clear();
        for (handle, body) in &self.bodies {
            self.grid.insert(handle, body.aabb());
        }
        let pairs = self.grid.pairs();
        let gs = self.grid.stats();
        self.last_stats.cells = gs.cells;
        self.last_stats.candidate_pairs = gs.candidate_pairs;
        self.last_stats.unique_pairs = pairs.len();
        pairs
    }

    fn narrow_phase(
        &mut self,
        pairs: &[(BodyHandle, BodyHandle)],
    ) -> (Vec<Manifold>, Vec<PendingEvent>) {
        let mut manifolds = Vec::new();
        let mut events = Vec::new();
        let mut sensors = 0;
        for &(ha, hb) in pairs {
            let (Some(a), Some(b)) = (self.bodies.get(ha), self.bodies.get(hb)) else {
                continue;
            };
            // covers both-static, both-sleeping and sleeping-on-static
            if !a.is_active() && !b.is_active() {
                continue;
            }
            if !a.filter.interacts(b.filter) {
                continue;
            }
            let Some(contact) = Narrowphase::collide(
                a.collider(),
                a.collider_center(),
                b.collider(),
                b.collider_center(),
                self.cfg.box_tie_break,
            ) else {
                continue;
            };
            let manifold = Manifold::from_contact(ha, hb, contact);
            if a.is_sensor || b.is_sensor {
                sensors += 1;
                if !self.sensor_listeners.is_empty() {
                    events.push(PendingEvent::Sensor(CollisionEvent {
                        body_a: ha,
                        body_b: hb,
                        manifold,
                    }));
                }
                continue;
            }
            if !self.collision_listeners.is_empty() {
                events.push(PendingEvent::Collision(CollisionEvent {
                    body_a: ha,
                    body_b: hb,
                    manifold: manifold.clone(),
                }));
            }
            manifolds.push(manifold);
        }
        self.last_stats.sensor_contacts = sensors;
        (manifolds, events)
    }

    /// Fire listeners in pair order. Listeners get `&mut self`, so they are
    /// taken out for the duration; any registered meanwhile are kept. Events
    /// whose bodies an earlier listener removed are dropped.
    fn dispatch(&mut self, events: Vec<PendingEvent>) {
        if events.is_empty() {
            return;
        }
        let mut collision = std::mem::take(&mut self.collision_listeners);
        let mut sensor = std::mem::take(&mut self.sensor_listeners);
        for ev in &events {
            let (listeners, e) = match ev {
                PendingEvent::Collision(e) => (&mut collision, e),
                PendingEvent::Sensor(e) => (&mut sensor, e),
            };
            for cb in listeners.iter_mut() {
                if !self.bodies.contains_key(e.body_a) || !self.bodies.contains_key(e.body_b) {
                    break;
                }
                cb(self, e);
            }
        }
        collision.append(&mut self.collision_listeners);
        sensor.append(&mut self.sensor_listeners);
        self.collision_listeners = collision;
        self.sensor_listeners = sensor;
    }

    fn solve_constraints(&mut self, dt: f32) {
        if self.constraints.is_empty() {
            return;
        }
        let sub_dt = dt / self.cfg.iterations as f32;
        for _ in 0..self.cfg.iterations {
            for c in self.constraints.values() {
                c.solve(&mut self.bodies, sub_dt);
            }
        }
    }

    fn integrate_positions(&mut self, dt: f32) {
        let cfg = &self.cfg;
        for (handle, body) in self.bodies.iter_mut() {
            if !body.is_active() {
                continue;
            }
            body.integrate_position(dt);
            if cfg.enable_sleep
                && body.update_sleep(dt, cfg.sleep_velocity_threshold, cfg.sleep_time_threshold)
            {
                trace!(?handle, "body asleep");
            }
        }
    }
}
