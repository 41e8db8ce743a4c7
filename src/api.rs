use glam::Vec2;

use crate::body::EntityPrototype;
use crate::level::{Level, RayTarget, Zone};
use crate::shapes::{Aabb, Triangle};
use crate::types::*;

/// Public API contract for the fixed-step platformer world.
pub trait PhysicsWorldApi {
    /// Construct a world over an already validated level.
    fn new(cfg: WorldConfig, level: Level) -> Self
    where
        Self: Sized;

    // --- Bodies ------------------------------------------------------------

    /// Add a body built from `prototype`, standing at `position`.
    fn spawn(&mut self, prototype: EntityPrototype, position: Vec2) -> BodyId;

    /// Remove a body. Returns false for unknown ids.
    fn despawn(&mut self, id: BodyId) -> bool;

    /// Replace the intended forces (input/brain layer) applied on following steps.
    fn set_forces(&mut self, id: BodyId, forces: Vec2);

    /// Start a jump if the body is on land. Returns true when the jump began.
    fn jump(&mut self, id: BodyId) -> bool;

    /// Current kinematic state of a body.
    fn state(&self, id: BodyId) -> Option<KinematicState>;

    /// Neighbourhood flags from the body's last resolved move.
    fn last_move(&self, id: BodyId) -> Option<MoveResult>;

    // --- Simulation --------------------------------------------------------

    /// Accumulate real elapsed seconds and run the owed fixed steps.
    /// Returns the number of steps run.
    fn advance(&mut self, elapsed: f32, contacts: &mut ColliderContacts) -> usize;

    /// Run exactly one fixed step over all bodies in insertion order.
    fn step(&mut self, contacts: &mut ColliderContacts);

    /// Drain and return zone events accumulated since the last drain.
    fn drain_events(&mut self) -> Vec<ZoneEvent>;

    // --- Queries -----------------------------------------------------------

    /// Nearest tile or static collider hit along a ray, up to `max_t`.
    fn raycast(&self, origin: Vec2, dir: Vec2, max_t: f32) -> Option<(RayTarget, RaycastHit)>;

    /// Zones overlapping the given box.
    fn query_zones(&self, bounds: &Aabb) -> Vec<&Zone>;
}

/// Narrowphase primitive intersection signatures.
pub trait NarrowphaseApi {
    // Overlaps --------------------------------------------------------------

    fn overlap_box_box(moving: &Aabb, other: &Aabb) -> Option<CollisionOutcome>;
    fn overlap_box_box_minkowski(moving: &Aabb, other: &Aabb) -> Option<CollisionOutcome>;
    fn overlap_box_triangle(moving: &Aabb, other: &Triangle) -> Option<CollisionOutcome>;

    // Sweeps ----------------------------------------------------------------

    fn sweep_box_box(moving: &Aabb, other: &Aabb, displacement: Vec2) -> Option<CollisionOutcome>;
    fn sweep_box_triangle(
        moving: &Aabb,
        other: &Triangle,
        displacement: Vec2,
    ) -> Option<CollisionOutcome>;

    // Rays ------------------------------------------------------------------

    fn ray_box(shape: &Aabb, origin: Vec2, dir: Vec2) -> Option<RaycastHit>;
    fn ray_triangle(shape: &Triangle, origin: Vec2, dir: Vec2) -> Option<RaycastHit>;
}

/// Solid level geometry the movement resolver can probe.
pub trait SolidQuery {
    /// True when `bounds` strictly overlaps something solid.
    fn collides(&self, bounds: &Aabb) -> bool;
}
