use glam::Vec2;

use crate::types::{KinematicState, MotionState, WorldConfig};

/// Tuning consumed by the integrator and the movement resolver.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MotionParams {
    pub gravity: Vec2,
    pub ground_friction: f32,
    /// Maximum horizontal speed, pixels/s.
    pub speed_cap: f32,
    /// Horizontal speeds below this snap to zero.
    pub velocity_epsilon: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        WorldConfig::default().motion_params()
    }
}

impl WorldConfig {
    pub fn motion_params(&self) -> MotionParams {
        MotionParams {
            gravity: self.gravity,
            ground_friction: self.ground_friction,
            speed_cap: self.speed_cap,
            velocity_epsilon: self.velocity_epsilon,
        }
    }
}

/// Advance one fixed step with semi-implicit (velocity Verlet style) Euler.
///
/// `forces` is the intended acceleration from input/brain; gravity is added
/// here, and friction opposes horizontal velocity while on land. The carried
/// `position_error` is folded into the new position and cleared.
pub fn integrate(state: &KinematicState, forces: Vec2, dt: f32, params: &MotionParams) -> KinematicState {
    let mut acceleration = forces + params.gravity;
    if state.motion == MotionState::OnLand {
        acceleration.x -= state.velocity.x * params.ground_friction;
    }

    let mut velocity = state.velocity + 0.5 * (state.acceleration + acceleration) * dt;
    velocity.x = velocity.x.clamp(-params.speed_cap, params.speed_cap);
    if velocity.x.abs() < params.velocity_epsilon {
        velocity.x = 0.0;
    }

    let position = state.position
        + state.position_error
        + state.velocity * dt
        + 0.5 * state.acceleration * dt * dt;

    KinematicState {
        position,
        velocity,
        acceleration,
        position_error: Vec2::ZERO,
        motion: state.motion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MotionParams {
        MotionParams {
            gravity: Vec2::new(0.0, -10.0),
            ground_friction: 0.0,
            speed_cap: 100.0,
            velocity_epsilon: 0.01,
        }
    }

    #[test]
    fn test_free_fall_uses_previous_velocity_and_acceleration() {
        let s = KinematicState {
            velocity: Vec2::new(0.0, 2.0),
            acceleration: Vec2::new(0.0, -10.0),
            ..KinematicState::at(Vec2::new(5.0, 5.0))
        };
        let n = integrate(&s, Vec2::ZERO, 0.5, &params());
        // p + v*dt + a*dt²/2 = 5 + 1 - 1.25
        assert!((n.position.y - 4.75).abs() < 1e-6);
        // v + (a + a')/2 * dt = 2 - 5
        assert!((n.velocity.y + 3.0).abs() < 1e-6);
        assert_eq!(n.acceleration, Vec2::new(0.0, -10.0));
    }

    #[test]
    fn test_speed_cap_and_snap() {
        let s = KinematicState {
            velocity: Vec2::new(99.0, 0.0),
            ..Default::default()
        };
        let n = integrate(&s, Vec2::new(1000.0, 0.0), 1.0, &params());
        assert_eq!(n.velocity.x, 100.0);

        let slow = KinematicState {
            velocity: Vec2::new(0.005, 0.0),
            ..Default::default()
        };
        let n = integrate(&slow, Vec2::ZERO, 0.1, &params());
        assert_eq!(n.velocity.x, 0.0);
    }

    #[test]
    fn test_ground_friction_only_on_land() {
        let p = MotionParams {
            ground_friction: 2.0,
            ..params()
        };
        let mut s = KinematicState {
            velocity: Vec2::new(10.0, 0.0),
            ..Default::default()
        };
        let airborne = integrate(&s, Vec2::ZERO, 0.1, &p);
        assert_eq!(airborne.acceleration.x, 0.0);

        s.motion = MotionState::OnLand;
        let grounded = integrate(&s, Vec2::ZERO, 0.1, &p);
        assert_eq!(grounded.acceleration.x, -20.0);
        assert!(grounded.velocity.x < 10.0);
    }

    #[test]
    fn test_position_error_is_consumed() {
        let s = KinematicState {
            position_error: Vec2::new(0.4, 0.0),
            ..KinematicState::at(Vec2::new(10.0, 0.0))
        };
        let p = MotionParams {
            gravity: Vec2::ZERO,
            ..params()
        };
        let n = integrate(&s, Vec2::ZERO, 1.0 / 60.0, &p);
        assert!((n.position.x - 10.4).abs() < 1e-6);
        assert_eq!(n.position_error, Vec2::ZERO);
    }
}
