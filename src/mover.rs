use glam::{BVec2, I64Vec2, IVec2, Vec2};
use tracing::trace;

use crate::api::SolidQuery;
use crate::integrator::{MotionParams, integrate};
use crate::types::{Collider, KinematicState, MoveResult, neighbor};

#[inline]
fn pixel_of(p: Vec2) -> IVec2 {
    p.floor().as_ivec2()
}

#[inline]
fn distance_sq(a: IVec2, b: IVec2) -> i64 {
    (a.as_i64vec2() - b.as_i64vec2()).length_squared()
}

#[inline]
fn chebyshev(a: IVec2, b: IVec2) -> i64 {
    let d: I64Vec2 = (a.as_i64vec2() - b.as_i64vec2()).abs();
    d.max_element()
}

/// Collision flag and squared distance to `target` for each neighbour of `pixel`.
fn probe<S: SolidQuery + ?Sized>(
    solids: &S,
    collider: &Collider,
    pixel: IVec2,
    target: IVec2,
) -> ([bool; 9], [i64; 9]) {
    let mut collided = [false; 9];
    let mut dist = [0i64; 9];
    for i in 0..9 {
        let candidate = pixel + neighbor::offset(i);
        collided[i] = solids.collides(&collider.aabb_at(candidate.as_vec2()));
        dist[i] = distance_sq(candidate, target);
    }
    (collided, dist)
}

/// Free neighbour closest to the target. The centre is kept unless another
/// slot is strictly closer; other ties go to the first slot in row-major order.
fn best_candidate(collided: &[bool; 9], dist: &[i64; 9]) -> Option<usize> {
    let mut best = (!collided[neighbor::CENTER]).then_some(neighbor::CENTER);
    for i in 0..9 {
        if i == neighbor::CENTER || collided[i] {
            continue;
        }
        match best {
            Some(b) if dist[i] >= dist[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Integrate one step, then resolve the destination against `solids`.
pub fn move_entity<S: SolidQuery + ?Sized>(
    state: &KinematicState,
    forces: Vec2,
    collider: &Collider,
    solids: &S,
    dt: f32,
    params: &MotionParams,
) -> MoveResult {
    let tentative = integrate(state, forces, dt, params);
    resolve_move(state.position, tentative, collider, solids)
}

/// Greedy pixel-by-pixel descent from `start` toward `tentative.position`.
///
/// Each pass probes the 3×3 neighbourhood and steps to the free neighbour
/// nearest the destination pixel. At most `chebyshev(start, dest) + 1`
/// neighbourhoods are evaluated, and every step strictly shortens the
/// distance while the current pixel is free. The fractional part of the
/// destination is kept only when the search reached the destination pixel
/// and the exact destination is free. If the search never left a colliding
/// start pixel but `start` itself is free, the body stays at `start`.
pub fn resolve_move<S: SolidQuery + ?Sized>(
    start: Vec2,
    tentative: KinematicState,
    collider: &Collider,
    solids: &S,
) -> MoveResult {
    let mut pixel = pixel_of(start);
    let destination = if tentative.position.is_finite() {
        tentative.position
    } else {
        start
    };
    let target = pixel_of(destination);
    let budget = chebyshev(pixel, target) + 1;

    let mut iterations = 0i64;
    let mut collided;
    loop {
        iterations += 1;
        let (flags, dist) = probe(solids, collider, pixel, target);
        collided = flags;
        match best_candidate(&collided, &dist) {
            Some(i) if i != neighbor::CENTER && iterations < budget => {
                pixel += neighbor::offset(i);
            }
            _ => break,
        }
    }

    // Only the unmoved start pixel can still collide; a free fractional start beats it
    let position = if pixel == target && !solids.collides(&collider.aabb_at(destination)) {
        destination
    } else if collided[neighbor::CENTER] && !solids.collides(&collider.aabb_at(start)) {
        start
    } else {
        pixel.as_vec2()
    };

    let remaining = destination - position;
    let blocked = BVec2::new(
        (remaining.x > 0.0 && collided[neighbor::EAST]) || (remaining.x < 0.0 && collided[neighbor::WEST]),
        (remaining.y > 0.0 && collided[neighbor::NORTH]) || (remaining.y < 0.0 && collided[neighbor::SOUTH]),
    );
    let mut velocity = tentative.velocity;
    if blocked.x {
        velocity.x = 0.0;
    }
    if blocked.y {
        velocity.y = 0.0;
    }

    // Sub-pixel leftovers on free axes are replayed next tick
    let carry = |r: f32, stop: bool| if stop || r.abs() >= 1.0 { 0.0 } else { r };
    let position_error = Vec2::new(carry(remaining.x, blocked.x), carry(remaining.y, blocked.y));

    trace!(?pixel, ?target, iterations, ?blocked, "resolved move");

    MoveResult {
        state: KinematicState {
            position,
            velocity,
            acceleration: tentative.acceleration,
            position_error,
            motion: tentative.motion,
        },
        collided,
        blocked,
        iterations: iterations as u32,
        pixel,
    }
}
