//! pixbonk: pixel-stepped 2D platformer collision (SAT tests, tile resolver, fixed-step world)

pub mod types;
pub mod error;
pub mod api;
pub mod shapes;
pub mod narrowphase;
pub mod tiles;
pub mod level;
pub mod integrator;
pub mod mover;
pub mod body;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::LoadError;
pub use crate::shapes::{Aabb, Edge, Shape, Triangle};
pub use crate::narrowphase::{Narrowphase, overlap, raycast, sweep};
pub use crate::tiles::{Tile, TileGrid};
pub use crate::level::{Level, LevelDesc, RayTarget, Zone, ZoneDesc};
pub use crate::integrator::{MotionParams, integrate};
pub use crate::mover::{move_entity, resolve_move};
pub use crate::body::{Body, EntityPrototype};
pub use crate::world::PhysicsWorld;
