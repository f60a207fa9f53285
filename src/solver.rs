//! Impulse-based contact resolution and Baumgarte-style positional correction.

use crate::body::RigidBody;
use crate::math::{cross, Vec2Ext};
use crate::types::Manifold;

/// One velocity pass over every contact of `m`.
///
/// Separating contacts are skipped. Returns true when at least one contact
/// was resolved; a sleeping body is woken in that case. An awake body keeps
/// its sleep timer so resting contacts can still settle.
pub fn resolve_velocity<U>(a: &mut RigidBody<U>, b: &mut RigidBody<U>, m: &Manifold) -> bool {
    let count = m.contacts.len() as f32;
    let mut touched = false;

    for contact in &m.contacts {
        let n = contact.normal;
        let ra = contact.point - a.position;
        let rb = contact.point - b.position;

        let rv = b.velocity_at_point(contact.point) - a.velocity_at_point(contact.point);
        let contact_vel = rv.dot(n);
        if contact_vel > 0.0 {
            continue;
        }

        let e = a.material.restitution.min(b.material.restitution);
        let ra_cn = cross(ra, n);
        let rb_cn = cross(rb, n);
        let inv_sum = a.inv_mass()
            + b.inv_mass()
            + ra_cn * ra_cn * a.inv_inertia()
            + rb_cn * rb_cn * b.inv_inertia();
        if inv_sum <= 0.0 {
            continue;
        }

        let j = -(1.0 + e) * contact_vel / inv_sum / count;
        let impulse = n * j;
        a.apply_impulse(-impulse, Some(contact.point));
        b.apply_impulse(impulse, Some(contact.point));
        touched = true;

        // Coulomb friction along the sliding direction.
        let rv = b.velocity_at_point(contact.point) - a.velocity_at_point(contact.point);
        let tangent = (rv - n * rv.dot(n)).safe_normalize();
        if tangent != glam::Vec2::ZERO {
            let ra_ct = cross(ra, tangent);
            let rb_ct = cross(rb, tangent);
            let inv_sum_t = a.inv_mass()
                + b.inv_mass()
                + ra_ct * ra_ct * a.inv_inertia()
                + rb_ct * rb_ct * b.inv_inertia();
            if inv_sum_t > 0.0 {
                let mu = (a.material.friction * b.material.friction).sqrt();
                let max_jt = j.abs() * mu;
                let jt = (-rv.dot(tangent) / inv_sum_t / count).clamp(-max_jt, max_jt);
                let friction = tangent * jt;
                a.apply_impulse(-friction, Some(contact.point));
                b.apply_impulse(friction, Some(contact.point));
            }
        }
    }

    if touched {
        a.wake_if_sleeping();
        b.wake_if_sleeping();
    }
    touched
}

/// Push the pair apart along the normal by a fraction of the penetration
/// beyond `slop`. Static bodies do not move.
pub fn correct_position<U>(
    a: &mut RigidBody<U>,
    b: &mut RigidBody<U>,
    m: &Manifold,
    slop: f32,
    percent: f32,
) {
    let inv_sum = a.inv_mass() + b.inv_mass();
    if inv_sum <= 0.0 {
        return;
    }
    let magnitude = (m.depth - slop).max(0.0) / inv_sum * percent;
    if magnitude == 0.0 {
        return;
    }
    let correction = m.normal * magnitude;
    a.nudge(-correction * a.inv_mass());
    b.nudge(correction * b.inv_mass());
}
