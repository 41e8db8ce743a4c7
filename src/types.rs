use glam::{BVec2, IVec2, Vec2};
use serde::Deserialize;

use crate::error::LoadError;
use crate::shapes::{Aabb, Edge};

/// Contact result shared by the instant and swept tests.
///
/// "No collision" is `None` at the call site; a returned outcome always has
/// `depth >= 0` and `time_to_contact` in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionOutcome {
    /// Penetration depth (≥ 0). Zero for a swept contact reported before overlap.
    pub depth: f32,
    /// Unit axis pointing from the moving box toward the other shape.
    /// Moving the box by `-axis * depth` separates the two.
    pub axis: Vec2,
    /// Fraction of the frame displacement at which contact begins; 0 when overlapping now.
    pub time_to_contact: f32,
    /// Edge of the other shape that faces the moving box along `axis`.
    pub contact_edge: Edge,
    /// How far the moving box must rise to sit on top of the other shape.
    pub vertical_distance_to_clear: f32,
}

/// Nearest edge crossing along a ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastHit {
    /// Ray parameter in units of the (unnormalized) direction.
    pub t: f32,
    pub point: Vec2,
    pub edge: Edge,
}

/// Entity collider: a box anchored relative to the entity position.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct Collider {
    #[serde(default)]
    pub offset: Vec2,
    pub half_extents: Vec2,
}

impl Collider {
    pub fn new(offset: Vec2, half_extents: Vec2) -> Self {
        Self { offset, half_extents }
    }

    /// World-space box for an entity standing at `position`.
    #[inline]
    pub fn aabb_at(&self, position: Vec2) -> Aabb {
        Aabb::new(position + self.offset, self.half_extents)
    }
}

/// Grounded-logic state; exactly one holds at a time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MotionState {
    OnLand,
    Jumping,
    #[default]
    Falling,
}

/// Kinematic state of one entity. Owned by the gameplay layer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct KinematicState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Sub-pixel remainder carried into the next tick's integration.
    pub position_error: Vec2,
    pub motion: MotionState,
}

impl KinematicState {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Indices into the 3×3 neighbourhood (row-major, row 0 = north = +Y).
pub mod neighbor {
    use glam::IVec2;

    pub const NORTH_WEST: usize = 0;
    pub const NORTH: usize = 1;
    pub const NORTH_EAST: usize = 2;
    pub const WEST: usize = 3;
    pub const CENTER: usize = 4;
    pub const EAST: usize = 5;
    pub const SOUTH_WEST: usize = 6;
    pub const SOUTH: usize = 7;
    pub const SOUTH_EAST: usize = 8;

    /// Pixel offset of neighbourhood slot `i`.
    #[inline]
    pub fn offset(i: usize) -> IVec2 {
        let col = (i % 3) as i32;
        let row = (i / 3) as i32;
        IVec2::new(col - 1, 1 - row)
    }

    #[inline]
    pub fn index(offset: IVec2) -> usize {
        ((1 - offset.y) * 3 + (offset.x + 1)) as usize
    }
}

/// Output of one pixel-stepped move.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MoveResult {
    /// Resolved state: corrected position, velocity and carried remainder.
    pub state: KinematicState,
    /// Per-neighbour collision flags around the final pixel.
    pub collided: [bool; 9],
    /// Axes on which intended motion was stopped by a wall.
    pub blocked: BVec2,
    /// Neighbourhood evaluations performed by the search.
    pub iterations: u32,
    /// Integer pixel the search ended on.
    pub pixel: IVec2,
}

impl MoveResult {
    #[inline]
    pub fn wall_below(&self) -> bool {
        self.collided[neighbor::SOUTH]
    }

    #[inline]
    pub fn wall_above(&self) -> bool {
        self.collided[neighbor::NORTH]
    }

    #[inline]
    pub fn wall_beside(&self) -> bool {
        self.collided[neighbor::WEST] || self.collided[neighbor::EAST]
    }
}

/// Frame-independent handle for a body in the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// Handle for a trigger zone of the loaded level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneId(pub u32);

/// A body overlapped a trigger zone during a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ZoneEvent {
    pub body: BodyId,
    pub zone: ZoneId,
}

/// Per-tick "is colliding" flags for the level's static colliders, keyed by collider index.
///
/// Owned by the caller (usually the debug renderer); the world only ORs hits into it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColliderContacts {
    flags: Vec<bool>,
}

impl ColliderContacts {
    pub fn new(len: usize) -> Self {
        Self { flags: vec![false; len] }
    }

    /// Clear all flags and resize to `len` colliders.
    pub fn reset(&mut self, len: usize) {
        self.flags.clear();
        self.flags.resize(len, false);
    }

    pub fn mark(&mut self, index: usize) {
        if index >= self.flags.len() {
            self.flags.resize(index + 1, false);
        }
        self.flags[index] = true;
    }

    pub fn is_colliding(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Indices of colliders touched this tick.
    pub fn hits(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags.iter().enumerate().filter(|(_, f)| **f).map(|(i, _)| i)
    }
}

/// World-level configuration for the fixed-step simulation.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Fixed simulation step in seconds (typ. 1/60).
    pub dt: f32,
    /// Gravity in pixels/s² (Y grows upward, so usually negative Y).
    pub gravity: Vec2,
    /// Horizontal damping per second applied while on land.
    pub ground_friction: f32,
    /// Maximum horizontal speed in pixels/s.
    pub speed_cap: f32,
    /// Horizontal speeds below this snap to zero.
    pub velocity_epsilon: f32,
    /// Upward speed given by a jump, pixels/s.
    pub jump_impulse: f32,
    /// Steps run per `advance` before leftover time is dropped.
    pub max_steps_per_frame: u32,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            gravity: Vec2::new(0.0, -900.0),
            ground_friction: 8.0,
            speed_cap: 120.0,
            velocity_epsilon: 1.0,
            jump_impulse: 300.0,
            max_steps_per_frame: 5,
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let cfg: WorldConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject step sizes and tuning the fixed-step loop cannot run with.
    pub fn validate(&self) -> Result<(), LoadError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(LoadError::Config("dt must be positive and finite"));
        }
        if !self.gravity.is_finite() {
            return Err(LoadError::Config("gravity must be finite"));
        }
        let tuning = [self.ground_friction, self.speed_cap, self.velocity_epsilon, self.jump_impulse];
        if !tuning.iter().all(|v| v.is_finite() && *v >= 0.0) {
            return Err(LoadError::Config("friction, speed cap, epsilon and jump impulse must be finite and non-negative"));
        }
        if self.max_steps_per_frame == 0 {
            return Err(LoadError::Config("max_steps_per_frame must be at least 1"));
        }
        Ok(())
    }
}

/// Debug statistics for the world.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub bodies: usize,
    pub colliders: usize,
    pub zones: usize,
    /// Fixed steps run since creation.
    pub steps: u64,
    /// Whole steps discarded by the catch-up cap.
    pub dropped_steps: u64,
}

/// Timing breakdown for the last completed step.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub step_ms: f64,
    pub resolve_ms: f64,
    pub contacts_ms: f64,
    pub zones_ms: f64,

    pub events_emitted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_layout() {
        assert_eq!(neighbor::offset(neighbor::NORTH), IVec2::new(0, 1));
        assert_eq!(neighbor::offset(neighbor::SOUTH), IVec2::new(0, -1));
        assert_eq!(neighbor::offset(neighbor::WEST), IVec2::new(-1, 0));
        assert_eq!(neighbor::offset(neighbor::EAST), IVec2::new(1, 0));
        assert_eq!(neighbor::offset(neighbor::CENTER), IVec2::ZERO);
        for i in 0..9 {
            assert_eq!(neighbor::index(neighbor::offset(i)), i);
        }
    }

    #[test]
    fn test_contacts_buffer() {
        let mut c = ColliderContacts::new(3);
        c.mark(1);
        c.mark(5);
        assert!(c.is_colliding(1));
        assert!(!c.is_colliding(0));
        assert!(!c.is_colliding(42));
        assert_eq!(c.hits().collect::<Vec<_>>(), vec![1, 5]);
        c.reset(2);
        assert_eq!(c.len(), 2);
        assert_eq!(c.hits().count(), 0);
    }

    #[test]
    fn test_world_config_from_partial_json() {
        let cfg = WorldConfig::from_json(r#"{ "speed_cap": 64.0, "gravity": [0.0, -500.0] }"#).unwrap();
        assert_eq!(cfg.speed_cap, 64.0);
        assert_eq!(cfg.gravity, Vec2::new(0.0, -500.0));
        assert_eq!(cfg.max_steps_per_frame, 5);
    }

    #[test]
    fn test_world_config_rejects_bad_step() {
        assert!(WorldConfig::default().validate().is_ok());
        assert!(matches!(WorldConfig::from_json(r#"{ "dt": 0.0 }"#), Err(LoadError::Config(_))));
        assert!(matches!(WorldConfig::from_json(r#"{ "dt": -0.016 }"#), Err(LoadError::Config(_))));
        assert!(matches!(WorldConfig::from_json(r#"{ "max_steps_per_frame": 0 }"#), Err(LoadError::Config(_))));
        assert!(matches!(WorldConfig::from_json(r#"{ "speed_cap": -1.0 }"#), Err(LoadError::Config(_))));
        assert!(matches!(WorldConfig::from_json(r#"{ "dt": "fast" }"#), Err(LoadError::Json(_))));
    }
}
