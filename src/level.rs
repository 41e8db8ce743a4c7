use glam::{IVec2, Vec2};
use serde::Deserialize;
use tracing::debug;

use crate::api::SolidQuery;
use crate::error::LoadError;
use crate::narrowphase;
use crate::shapes::{Aabb, Shape};
use crate::tiles::{Tile, TileGrid};
use crate::types::{RaycastHit, ZoneId};

/// JSON description of a level, as produced by the level editor.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelDesc {
    pub tile_size: f32,
    /// Tile rows, top row first: `#` wall, `.` empty.
    pub rows: Vec<String>,
    /// Optional sprite indices, same dimensions as `rows`.
    #[serde(default)]
    pub sprites: Option<Vec<Vec<u16>>>,
    /// Static colliders beyond the tile layer (slopes, ledges).
    #[serde(default)]
    pub colliders: Vec<Shape>,
    #[serde(default)]
    pub zones: Vec<ZoneDesc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ZoneDesc {
    pub name: String,
    pub shape: Shape,
}

/// Named trigger area; bodies overlapping it produce zone events.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub shape: Shape,
}

/// What a level raycast hit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RayTarget {
    Tile { col: i32, row: i32 },
    Collider(usize),
}

/// Immutable level geometry: tile layer, static colliders and trigger zones.
#[derive(Clone, Debug)]
pub struct Level {
    grid: TileGrid,
    colliders: Vec<Shape>,
    zones: Vec<Zone>,
}

impl Level {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            colliders: Vec::new(),
            zones: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let desc: LevelDesc = serde_json::from_str(json)?;
        Self::from_desc(desc)
    }

    pub fn from_desc(desc: LevelDesc) -> Result<Self, LoadError> {
        let mut grid = TileGrid::from_rows(&desc.rows, desc.tile_size)?;
        if let Some(sprites) = &desc.sprites {
            grid = grid.with_sprites(sprites)?;
        }
        let mut level = Level::new(grid);
        for shape in desc.colliders {
            level = level.with_collider(shape)?;
        }
        for zone in desc.zones {
            level = level.with_zone(zone.name, zone.shape)?;
        }
        debug!(
            width = level.grid.width(),
            height = level.grid.height(),
            colliders = level.colliders.len(),
            zones = level.zones.len(),
            "level loaded"
        );
        Ok(level)
    }

    pub fn with_collider(mut self, shape: Shape) -> Result<Self, LoadError> {
        if !shape.is_well_formed() {
            return Err(LoadError::Collider {
                index: self.colliders.len(),
                reason: malformed_reason(&shape),
            });
        }
        self.colliders.push(shape);
        Ok(self)
    }

    pub fn with_zone(mut self, name: impl Into<String>, shape: Shape) -> Result<Self, LoadError> {
        let name = name.into();
        if !shape.is_well_formed() {
            return Err(LoadError::Zone {
                name,
                reason: malformed_reason(&shape),
            });
        }
        let id = ZoneId(self.zones.len() as u32);
        self.zones.push(Zone { id, name, shape });
        Ok(self)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn colliders(&self) -> &[Shape] {
        &self.colliders
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// Zones strictly overlapping `bounds`.
    pub fn zones_overlapping(&self, bounds: Aabb) -> impl Iterator<Item = &Zone> + '_ {
        self.zones
            .iter()
            .filter(move |z| narrowphase::overlap(&bounds, &z.shape).is_some())
    }

    /// Nearest wall tile or static collider along `origin + dir * t`, `t <= max_t`.
    pub fn raycast(&self, origin: Vec2, dir: Vec2, max_t: f32) -> Option<(RayTarget, RaycastHit)> {
        if dir.length_squared() == 0.0 {
            return None;
        }
        let mut best = self.raycast_tiles(origin, dir, max_t);
        for (i, shape) in self.colliders.iter().enumerate() {
            let Some(hit) = narrowphase::raycast(shape, origin, dir) else {
                continue;
            };
            if hit.t > max_t {
                continue;
            }
            match &best {
                Some((_, b)) if hit.t >= b.t => {}
                _ => best = Some((RayTarget::Collider(i), hit)),
            }
        }
        best
    }

    fn raycast_tiles(&self, origin: Vec2, dir: Vec2, max_t: f32) -> Option<(RayTarget, RaycastHit)> {
        // DDA over tile cells in (col, y-cell) space; rows are flipped on lookup
        let ts = self.grid.tile_size();
        let start = (origin / ts).floor();
        let mut cell = IVec2::new(start.x as i32, start.y as i32);
        let step_x = if dir.x > 0.0 { 1 } else if dir.x < 0.0 { -1 } else { 0 };
        let step_y = if dir.y > 0.0 { 1 } else if dir.y < 0.0 { -1 } else { 0 };
        let next_boundary = |c: i32, step: i32| -> f32 {
            if step > 0 { (c as f32 + 1.0) * ts } else { c as f32 * ts }
        };
        let mut t_max_x = if step_x != 0 {
            (next_boundary(cell.x, step_x) - origin.x) / dir.x
        } else {
            f32::INFINITY
        };
        let mut t_max_y = if step_y != 0 {
            (next_boundary(cell.y, step_y) - origin.y) / dir.y
        } else {
            f32::INFINITY
        };
        let t_delta_x = if step_x != 0 { ts / dir.x.abs() } else { f32::INFINITY };
        let t_delta_y = if step_y != 0 { ts / dir.y.abs() } else { f32::INFINITY };

        let height = self.grid.height() as i32;
        let mut t_curr = 0.0f32;
        for _ in 0..10_000 {
            if t_curr > max_t {
                break;
            }
            let row = height - 1 - cell.y;
            if self.grid.get(cell.x, row) == Tile::Wall {
                let tile = Shape::Box(self.grid.tile_bounds(cell.x, row));
                if let Some(hit) = narrowphase::raycast(&tile, origin, dir) {
                    if hit.t <= max_t {
                        return Some((RayTarget::Tile { col: cell.x, row }, hit));
                    }
                }
            }

            if t_max_x < t_max_y {
                cell.x += step_x;
                t_curr = t_max_x;
                t_max_x += t_delta_x;
            } else {
                cell.y += step_y;
                t_curr = t_max_y;
                t_max_y += t_delta_y;
            }
        }
        None
    }
}

fn malformed_reason(shape: &Shape) -> &'static str {
    match shape {
        Shape::Box(_) => "box extents must be finite and non-negative",
        Shape::Triangle(_) => "triangle must be finite with nonzero area",
    }
}

impl SolidQuery for Level {
    fn collides(&self, bounds: &Aabb) -> bool {
        self.grid.collides(bounds)
            || self
                .colliders
                .iter()
                .any(|shape| narrowphase::overlap(bounds, shape).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = include_str!("../tests/data/ledge_level.json");

    #[test]
    fn test_level_from_json() {
        let level = Level::from_json(LEVEL).unwrap();
        assert_eq!(level.grid().width(), 8);
        assert_eq!(level.grid().height(), 4);
        assert_eq!(level.colliders().len(), 2);
        assert!(matches!(level.colliders()[0], Shape::Triangle(_)));
        assert_eq!(level.zone_by_name("exit").map(|z| z.id), Some(ZoneId(0)));
    }

    #[test]
    fn test_level_rejects_degenerate_triangle() {
        let json = r#"{
            "tile_size": 8.0,
            "rows": ["...."],
            "colliders": [{ "type": "triangle", "vertices": [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]] }]
        }"#;
        assert!(matches!(Level::from_json(json), Err(LoadError::Collider { index: 0, .. })));
    }

    #[test]
    fn test_level_rejects_negative_zone_extents() {
        let grid = TileGrid::new(2, 2, 8.0).unwrap();
        let bad = Shape::Box(Aabb::new(Vec2::ZERO, Vec2::new(-1.0, 1.0)));
        assert!(matches!(Level::new(grid).with_zone("z", bad), Err(LoadError::Zone { .. })));
    }

    #[test]
    fn test_level_rejects_bad_json() {
        assert!(matches!(Level::from_json("{ \"rows\": 3 }"), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_solid_query_includes_slopes() {
        let level = Level::from_json(LEVEL).unwrap();
        // Above the flat floor but inside the ramp
        let on_ramp = Aabb::new(Vec2::new(30.0, 11.0), Vec2::splat(1.0));
        assert!(!level.grid().collides(&on_ramp));
        assert!(level.collides(&on_ramp));
        let clear = Aabb::new(Vec2::new(20.0, 14.0), Vec2::splat(1.0));
        assert!(!level.collides(&clear));
    }

    #[test]
    fn test_raycast_hits_tile_then_collider() {
        let level = Level::from_json(LEVEL).unwrap();
        // Straight down onto the floor
        let (target, hit) = level.raycast(Vec2::new(12.0, 28.0), Vec2::new(0.0, -1.0), 100.0).unwrap();
        assert_eq!(target, RayTarget::Tile { col: 1, row: 3 });
        assert!((hit.t - 20.0).abs() < 1e-4);
        // Down onto the floating ledge collider
        let (target, hit) = level.raycast(Vec2::new(48.0, 28.0), Vec2::new(0.0, -1.0), 100.0).unwrap();
        assert_eq!(target, RayTarget::Collider(1));
        assert!((hit.t - 7.0).abs() < 1e-4);
        // Limited reach
        assert!(level.raycast(Vec2::new(12.0, 28.0), Vec2::new(0.0, -1.0), 5.0).is_none());
    }

    #[test]
    fn test_zones_overlapping() {
        let level = Level::from_json(LEVEL).unwrap();
        let inside = Aabb::new(Vec2::new(55.0, 12.0), Vec2::splat(2.0));
        let names: Vec<_> = level.zones_overlapping(inside).map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["exit"]);
        let outside = Aabb::new(Vec2::new(10.0, 12.0), Vec2::splat(2.0));
        assert_eq!(level.zones_overlapping(outside).count(), 0);
    }
}
