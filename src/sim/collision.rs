//! Collision detection and response for the bubble field
//!
//! Bubbles are soft circles in a rectangular field: pairwise circle
//! contacts resolved with an impulse along the contact normal, plus
//! side-wall bounces with energy loss.

use glam::Vec2;

use super::state::Bubble;
use crate::consts::*;

/// Result of a circle-circle contact test
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Unit normal from the first circle's center toward the second's
    pub normal: Vec2,
    /// Overlap depth along the normal
    pub depth: f32,
}

/// Test two circles for contact
///
/// Returns `None` when the pair is separated, and also when the centers
/// coincide exactly: there is no usable normal, so the degenerate pair is
/// skipped rather than divided by zero.
pub fn circle_contact(
    a_pos: Vec2,
    a_radius: f32,
    b_pos: Vec2,
    b_radius: f32,
) -> Option<Contact> {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    if dist == 0.0 {
        return None;
    }
    let reach = a_radius + b_radius + CONTACT_BUFFER;
    if dist >= reach {
        return None;
    }
    Some(Contact {
        normal: delta / dist,
        depth: reach - dist,
    })
}

/// Resolve one contact between two bubbles
///
/// Pairs already separating along the normal are left alone. Otherwise an
/// equal-and-opposite impulse is applied along the normal and the overlap
/// is split evenly, pushing each bubble half the depth away from the
/// contact.
pub fn resolve_pair(a: &mut Bubble, b: &mut Bubble, contact: Contact) {
    let closing = (b.vel - a.vel).dot(contact.normal);
    if closing > 0.0 {
        return;
    }

    let impulse = -(1.0 + BOUNCE_RESTITUTION) * closing / 2.0;
    a.vel -= contact.normal * impulse;
    b.vel += contact.normal * impulse;

    let push = contact.normal * (contact.depth / 2.0);
    a.pos -= push;
    b.pos += push;
}

/// Keep a bubble inside the side walls
///
/// Crossing an edge (radius plus padding included) clamps the position to
/// the bound and inverts the horizontal velocity with energy loss. Only a
/// velocity pointing into the wall is inverted, so a freshly bounced
/// bubble can't get stuck oscillating on the bound.
pub fn wall_bounce(bubble: &mut Bubble) {
    let min_x = bubble.radius + WALL_PADDING;
    let max_x = FIELD_WIDTH - bubble.radius - WALL_PADDING;

    if bubble.pos.x <= min_x {
        bubble.pos.x = min_x;
        if bubble.vel.x < 0.0 {
            bubble.vel.x = -bubble.vel.x * WALL_RESTITUTION;
        }
    } else if bubble.pos.x >= max_x {
        bubble.pos.x = max_x;
        if bubble.vel.x > 0.0 {
            bubble.vel.x = -bubble.vel.x * WALL_RESTITUTION;
        }
    }
}
