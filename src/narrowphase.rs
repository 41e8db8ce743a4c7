use arrayvec::ArrayVec;
use glam::Vec2;
use tracing::debug;

use crate::api::NarrowphaseApi;
use crate::shapes::{Aabb, Edge, Shape, Triangle};
use crate::types::*;

/// Two box basis axes plus at most three triangle edge normals.
pub const MAX_AXES: usize = 5;

type Axes = ArrayVec<Vec2, MAX_AXES>;

/// Candidate separating axes, in enumeration order: box X, box Y, then edge normals.
fn candidate_axes(other: &Shape) -> Axes {
    let mut axes = Axes::new();
    axes.push(Vec2::X);
    axes.push(Vec2::Y);
    if let Shape::Triangle(tri) = other {
        for edge in tri.edges() {
            axes.push(edge.normal);
        }
    }
    axes
}

/// 1-D penetration of interval `a` into `b`, and whether `a` sits on the low side.
#[inline]
fn interval_overlap(a: (f32, f32), b: (f32, f32)) -> (f32, bool) {
    let from_low = a.1 - b.0;
    let from_high = b.1 - a.0;
    if from_low <= from_high {
        (from_low, true)
    } else {
        (from_high, false)
    }
}

/// Edge of `other` whose outward normal best opposes `axis` (first wins).
fn contact_edge(other: &Shape, axis: Vec2) -> Edge {
    let mut best: Option<(f32, Edge)> = None;
    for edge in other.edges() {
        let facing = edge.normal.dot(-axis);
        match best {
            Some((f, _)) if facing <= f => {}
            _ => best = Some((facing, edge)),
        }
    }
    match best {
        Some((_, edge)) => edge,
        None => Edge { start: Vec2::ZERO, end: Vec2::ZERO, normal: -axis },
    }
}

fn vertical_clearance(moving: &Aabb, other: &Shape) -> f32 {
    let (min, max) = (moving.min(), moving.max());
    match other.top_over_span(min.x, max.x) {
        Some(top) => top - min.y,
        None => 0.0,
    }
}

fn outcome(moving: &Aabb, other: &Shape, depth: f32, axis: Vec2, toi: f32) -> CollisionOutcome {
    CollisionOutcome {
        depth,
        axis,
        time_to_contact: toi,
        contact_edge: contact_edge(other, axis),
        vertical_distance_to_clear: vertical_clearance(moving, other),
    }
}

/// Instant SAT test between a moving box and static geometry.
///
/// Returns `None` when some candidate axis shows zero or negative overlap;
/// touching shapes do not collide. Otherwise reports the axis of least
/// penetration; the first axis reaching the minimum wins.
pub fn overlap(moving: &Aabb, other: &Shape) -> Option<CollisionOutcome> {
    let mut best: Option<(f32, Vec2)> = None;
    for axis in candidate_axes(other) {
        let (amount, low_side) = interval_overlap(moving.project(axis), other.project(axis));
        if amount <= 0.0 {
            return None;
        }
        let oriented = if low_side { axis } else { -axis };
        match best {
            Some((depth, _)) if amount >= depth => {}
            _ => best = Some((amount, oriented)),
        }
    }
    let (depth, axis) = best?;
    Some(outcome(moving, other, depth, axis, 0.0))
}

/// Displacement-aware SAT test.
///
/// Overlap now is reported with `time_to_contact == 0`. Otherwise every axis
/// must overlap somewhere along the displacement; the latest entry time over
/// all axes is the first instant of contact. Axes the motion is parallel to
/// contribute no timing.
pub fn sweep(moving: &Aabb, other: &Shape, displacement: Vec2) -> Option<CollisionOutcome> {
    if let Some(hit) = overlap(moving, other) {
        return Some(hit);
    }

    let mut entry: Option<(f32, Vec2)> = None;
    let mut exit = f32::INFINITY;
    for axis in candidate_axes(other) {
        let (a_min, a_max) = moving.project(axis);
        let (b_min, b_max) = other.project(axis);
        let s = displacement.dot(axis);

        let swept_min = a_min + s.min(0.0);
        let swept_max = a_max + s.max(0.0);
        if swept_max <= b_min || b_max <= swept_min {
            // Separating axis for the whole frame
            return None;
        }
        if s == 0.0 {
            continue;
        }

        let speed = s.abs();
        // Leading-face penetration after the full displacement, and distance until the trailing face leaves.
        let (future_overlap, trailing) = if s > 0.0 {
            (a_max + s - b_min, b_max - a_min)
        } else {
            (b_max - (a_min + s), a_max - b_min)
        };
        let t = (speed - future_overlap) / speed;
        exit = exit.min(trailing / speed);

        let oriented = if s > 0.0 { axis } else { -axis };
        match entry {
            Some((best, _)) if t <= best => {}
            _ => entry = Some((t, oriented)),
        }
    }

    let (toi, axis) = entry?;
    let toi = toi.max(0.0);
    if toi >= exit || toi > 1.0 {
        return None;
    }
    if toi == 0.0 {
        // Touching now but not overlapping; contact is reported at t=0 on the future branch.
        debug!(?axis, ?displacement, "swept contact at t=0 without current overlap");
    }
    let at_contact = moving.translated(displacement * toi);
    Some(outcome(&at_contact, other, 0.0, axis, toi))
}

/// Ray against the edges of a shape; nearest crossing wins.
///
/// Edges parallel to the ray are skipped. A crossing counts when it lies in
/// front of the origin and within `[0, 1)` along the edge.
pub fn raycast(shape: &Shape, origin: Vec2, direction: Vec2) -> Option<RaycastHit> {
    let mut best: Option<RaycastHit> = None;
    for edge in shape.edges() {
        let Some(t) = ray_edge(origin, direction, &edge) else {
            continue;
        };
        match best {
            Some(ref hit) if t >= hit.t => {}
            _ => {
                best = Some(RaycastHit {
                    t,
                    point: origin + direction * t,
                    edge,
                })
            }
        }
    }
    best
}

/// Solve `origin + u*dir = start + v*(end - start)`; returns `u`.
#[inline]
fn ray_edge(origin: Vec2, dir: Vec2, edge: &Edge) -> Option<f32> {
    let e = edge.direction();
    let det = dir.perp_dot(e);
    if det == 0.0 {
        return None;
    }
    let q = edge.start - origin;
    let u = q.perp_dot(e) / det;
    let v = q.perp_dot(dir) / det;
    (u >= 0.0 && (0.0..1.0).contains(&v)).then_some(u)
}

/// Narrowphase primitive tests.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn overlap_box_box(moving: &Aabb, other: &Aabb) -> Option<CollisionOutcome> {
        overlap(moving, &Shape::Box(*other))
    }

    fn overlap_box_box_minkowski(moving: &Aabb, other: &Aabb) -> Option<CollisionOutcome> {
        // moving ⊖ other is itself a box; the shapes overlap iff it strictly contains the origin
        let md_min = moving.min() - other.max();
        let md_max = moving.max() - other.min();
        if md_min.x >= 0.0 || md_max.x <= 0.0 || md_min.y >= 0.0 || md_max.y <= 0.0 {
            return None;
        }

        // Nearest face of the difference to the origin gives the penetration
        let (dx, ax) = if md_max.x <= -md_min.x {
            (md_max.x, Vec2::X)
        } else {
            (-md_min.x, Vec2::NEG_X)
        };
        let (dy, ay) = if md_max.y <= -md_min.y {
            (md_max.y, Vec2::Y)
        } else {
            (-md_min.y, Vec2::NEG_Y)
        };
        let (depth, axis) = if dy < dx { (dy, ay) } else { (dx, ax) };
        Some(outcome(moving, &Shape::Box(*other), depth, axis, 0.0))
    }

    fn overlap_box_triangle(moving: &Aabb, other: &Triangle) -> Option<CollisionOutcome> {
        overlap(moving, &Shape::Triangle(*other))
    }

    fn sweep_box_box(moving: &Aabb, other: &Aabb, displacement: Vec2) -> Option<CollisionOutcome> {
        sweep(moving, &Shape::Box(*other), displacement)
    }

    fn sweep_box_triangle(
        moving: &Aabb,
        other: &Triangle,
        displacement: Vec2,
    ) -> Option<CollisionOutcome> {
        sweep(moving, &Shape::Triangle(*other), displacement)
    }

    fn ray_box(shape: &Aabb, origin: Vec2, dir: Vec2) -> Option<RaycastHit> {
        raycast(&Shape::Box(*shape), origin, dir)
    }

    fn ray_triangle(shape: &Triangle, origin: Vec2, dir: Vec2) -> Option<RaycastHit> {
        raycast(&Shape::Triangle(*shape), origin, dir)
    }
}
