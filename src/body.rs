use glam::Vec2;
use serde::Deserialize;

use crate::error::LoadError;
use crate::types::{BodyId, Collider, KinematicState, MotionState, MoveResult};

/// Shared template for spawned entities, loaded from JSON.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EntityPrototype {
    pub name: String,
    pub collider: Collider,
    /// Overrides `WorldConfig::speed_cap` for this entity.
    #[serde(default)]
    pub speed_cap: Option<f32>,
    /// Overrides `WorldConfig::jump_impulse` for this entity.
    #[serde(default)]
    pub jump_impulse: Option<f32>,
}

impl EntityPrototype {
    pub fn new(name: impl Into<String>, collider: Collider) -> Self {
        Self {
            name: name.into(),
            collider,
            speed_cap: None,
            jump_impulse: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let proto: EntityPrototype = serde_json::from_str(json)?;
        proto.validate()?;
        Ok(proto)
    }

    /// Reject colliders and tuning values the resolver cannot work with.
    pub fn validate(&self) -> Result<(), LoadError> {
        let fail = |reason| {
            Err(LoadError::Prototype {
                name: self.name.clone(),
                reason,
            })
        };
        let h = self.collider.half_extents;
        if !(h.is_finite() && h.x > 0.0 && h.y > 0.0) {
            return fail("collider half extents must be positive and finite");
        }
        if !self.collider.offset.is_finite() {
            return fail("collider offset must be finite");
        }
        let tuning_ok = |v: Option<f32>| v.is_none_or(|v| v.is_finite() && v >= 0.0);
        if !tuning_ok(self.speed_cap) {
            return fail("speed cap must be finite and non-negative");
        }
        if !tuning_ok(self.jump_impulse) {
            return fail("jump impulse must be finite and non-negative");
        }
        Ok(())
    }
}

impl KinematicState {
    /// Leave the ground with upward speed `impulse`. Only allowed on land.
    pub fn jump(&mut self, impulse: f32) -> bool {
        if self.motion != MotionState::OnLand {
            return false;
        }
        self.velocity.y = impulse;
        self.motion = MotionState::Jumping;
        true
    }

    pub fn land(&mut self) {
        self.motion = MotionState::OnLand;
    }

    pub fn fall(&mut self) {
        self.motion = MotionState::Falling;
    }

    /// Update the motion state from the neighbourhood of a resolved move.
    pub fn apply_contacts(&mut self, result: &MoveResult) {
        let grounded = result.wall_below();
        match self.motion {
            _ if grounded && self.velocity.y <= 0.0 => self.land(),
            MotionState::OnLand if !grounded => self.fall(),
            MotionState::Jumping if self.velocity.y <= 0.0 => self.fall(),
            _ => {}
        }
    }
}

/// A spawned entity owned by the world.
#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub prototype: EntityPrototype,
    pub state: KinematicState,
    /// Intended acceleration from the input/brain layer.
    pub forces: Vec2,
    pub last_move: Option<MoveResult>,
}

impl Body {
    pub fn new(id: BodyId, prototype: EntityPrototype, position: Vec2) -> Self {
        Self {
            id,
            prototype,
            state: KinematicState::at(position),
            forces: Vec2::ZERO,
            last_move: None,
        }
    }

    #[inline]
    pub fn collider(&self) -> &Collider {
        &self.prototype.collider
    }
}
