use glam::Vec2;

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::api::PhysicsWorldApi;
use crate::body::{Body, EntityPrototype};
use crate::integrator::integrate;
use crate::level::{Level, RayTarget, Zone};
use crate::mover::resolve_move;
use crate::narrowphase;
use crate::shapes::Aabb;
use crate::types::*;

const MIN_STEP: f32 = 1e-5;
const DEFAULT_STEP: f32 = 1.0 / 60.0;

/// Fixed-step platformer world: one static level plus the bodies moving through it.
pub struct PhysicsWorld {
    pub cfg: WorldConfig,

    level: Level,
    bodies: Vec<Body>,
    next_id: u32,

    // Unsimulated real time, in seconds
    accumulator: f32,

    // Zone events since the last drain
    events: Vec<ZoneEvent>,

    steps: u64,
    dropped_steps: u64,

    // Timing for the last step (optional)
    last_timing: Option<WorldTiming>,
}

#[inline]
fn ms_since(t: Option<Instant>) -> f64 {
    t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
}

impl PhysicsWorldApi for PhysicsWorld {
    fn new(cfg: WorldConfig, level: Level) -> Self {
        if let Err(err) = cfg.validate() {
            warn!(%err, "world config rejected; stepping with a clamped dt");
        }
        Self {
            cfg,
            level,
            bodies: Vec::new(),
            next_id: 0,
            accumulator: 0.0,
            events: Vec::new(),
            steps: 0,
            dropped_steps: 0,
            last_timing: None,
        }
    }

    fn spawn(&mut self, prototype: EntityPrototype, position: Vec2) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        debug!(id = id.0, prototype = %prototype.name, x = position.x, y = position.y, "spawn");
        self.bodies.push(Body::new(id, prototype, position));
        id
    }

    fn despawn(&mut self, id: BodyId) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.id != id);
        self.bodies.len() != before
    }

    fn set_forces(&mut self, id: BodyId, forces: Vec2) {
        if let Some(body) = self.body_mut(id) {
            body.forces = forces;
        }
    }

    fn jump(&mut self, id: BodyId) -> bool {
        let default_impulse = self.cfg.jump_impulse;
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        let impulse = body.prototype.jump_impulse.unwrap_or(default_impulse);
        body.state.jump(impulse)
    }

    fn state(&self, id: BodyId) -> Option<KinematicState> {
        self.body(id).map(|b| b.state)
    }

    fn last_move(&self, id: BodyId) -> Option<MoveResult> {
        self.body(id).and_then(|b| b.last_move)
    }

    fn advance(&mut self, elapsed: f32, contacts: &mut ColliderContacts) -> usize {
        if !(elapsed.is_finite() && elapsed > 0.0) {
            return 0;
        }
        let dt = self.step_dt();
        self.accumulator += elapsed;

        let owed = (self.accumulator / dt).floor() as u64;
        let cap = u64::from(self.cfg.max_steps_per_frame);
        let run = owed.min(cap);
        for _ in 0..run {
            self.step(contacts);
        }
        self.accumulator -= run as f32 * dt;

        if owed > cap {
            // Drop the backlog; the fractional remainder still carries over
            let dropped = owed - cap;
            self.accumulator -= dropped as f32 * dt;
            self.dropped_steps += dropped;
            warn!(dropped, cap, "simulation fell behind, dropping catch-up steps");
        }
        self.accumulator = self.accumulator.max(0.0);
        run as usize
    }

    fn step(&mut self, contacts: &mut ColliderContacts) {
        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        let mut timing = WorldTiming::default();
        let dt = self.step_dt();
        let base = self.cfg.motion_params();
        let events_before = self.events.len();

        for body in &mut self.bodies {
            let t0 = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
            let mut params = base;
            if let Some(cap) = body.prototype.speed_cap {
                params.speed_cap = cap;
            }
            let collider = *body.collider();
            let start = body.state.position;
            let tentative = integrate(&body.state, body.forces, dt, &params);
            let intended = tentative.position - start;

            let result = resolve_move(start, tentative, &collider, &self.level);
            let mut state = result.state;
            state.apply_contacts(&result);
            body.state = state;
            body.last_move = Some(result);
            timing.resolve_ms += ms_since(t0);

            // Contacts: the start box swept along the intended motion
            let t1 = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
            let start_box = collider.aabb_at(start);
            for (i, shape) in self.level.colliders().iter().enumerate() {
                if narrowphase::sweep(&start_box, shape, intended).is_some() {
                    contacts.mark(i);
                }
            }
            timing.contacts_ms += ms_since(t1);

            let t2 = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
            let bounds = collider.aabb_at(state.position);
            for zone in self.level.zones_overlapping(bounds) {
                self.events.push(ZoneEvent { body: body.id, zone: zone.id });
            }
            timing.zones_ms += ms_since(t2);

            trace!(
                id = body.id.0,
                x = state.position.x,
                y = state.position.y,
                motion = ?state.motion,
                iterations = result.iterations,
                "body stepped"
            );
        }

        self.steps += 1;
        if let Some(t_all) = t_all {
            timing.step_ms = t_all.elapsed().as_secs_f64() * 1000.0;
            timing.events_emitted = self.events.len() - events_before;
            self.last_timing = Some(timing);
        }
    }

    fn drain_events(&mut self) -> Vec<ZoneEvent> {
        std::mem::take(&mut self.events)
    }

    fn raycast(&self, origin: Vec2, dir: Vec2, max_t: f32) -> Option<(RayTarget, RaycastHit)> {
        self.level.raycast(origin, dir, max_t)
    }

    fn query_zones(&self, bounds: &Aabb) -> Vec<&Zone> {
        self.level.zones_overlapping(*bounds).collect()
    }
}

impl PhysicsWorld {
    // Shared by `advance` and `step` so counting and integration agree
    fn step_dt(&self) -> f32 {
        if self.cfg.dt.is_finite() { self.cfg.dt.max(MIN_STEP) } else { DEFAULT_STEP }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Return debug stats for the world.
    pub fn debug_stats(&self) -> WorldStats {
        WorldStats {
            bodies: self.bodies.len(),
            colliders: self.level.colliders().len(),
            zones: self.level.zones().len(),
            steps: self.steps,
            dropped_steps: self.dropped_steps,
        }
    }

    /// Return timing breakdown for the last `step`.
    pub fn timing(&self) -> Option<WorldTiming> { self.last_timing }
}
