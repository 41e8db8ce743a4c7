use glam::{IVec2, Vec2};

use crate::api::{NarrowphaseApi, SolidQuery};
use crate::error::LoadError;
use crate::narrowphase::Narrowphase;
use crate::shapes::Aabb;

/// One cell of the level's tile layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
}

impl Tile {
    pub fn from_glyph(glyph: char) -> Option<Tile> {
        match glyph {
            '#' => Some(Tile::Wall),
            '.' | ' ' => Some(Tile::Empty),
            _ => None,
        }
    }
}

/// Fixed-size tile layer plus a parallel sprite-index layer.
///
/// Row 0 is the top row; world Y grows upward, so row `r` covers
/// `y ∈ [(height - 1 - r) * tile_size, (height - r) * tile_size]`.
/// Lookups outside the grid are `Empty`: level boundaries are open.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    tiles: Vec<Tile>,
    sprites: Vec<u16>,
}

impl TileGrid {
    /// All-empty grid.
    pub fn new(width: usize, height: usize, tile_size: f32) -> Result<Self, LoadError> {
        if width == 0 || height == 0 {
            return Err(LoadError::EmptyGrid);
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(LoadError::TileSize(tile_size));
        }
        Ok(Self {
            width,
            height,
            tile_size,
            tiles: vec![Tile::Empty; width * height],
            sprites: vec![0; width * height],
        })
    }

    /// Parse rows of `#` (wall) and `.` (empty), top row first.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self, LoadError> {
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let mut grid = Self::new(width, rows.len(), tile_size)?;
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(LoadError::RowWidth { row, expected: width, found });
            }
            for (col, glyph) in line.chars().enumerate() {
                let tile = Tile::from_glyph(glyph).ok_or(LoadError::UnknownTile { glyph, col, row })?;
                grid.tiles[row * width + col] = tile;
            }
        }
        Ok(grid)
    }

    /// Attach the sprite layer (one row per tile row, top row first).
    pub fn with_sprites(mut self, sprites: &[Vec<u16>]) -> Result<Self, LoadError> {
        let found_h = sprites.len();
        let found_w = sprites.first().map_or(0, Vec::len);
        let bad_row = sprites.iter().any(|r| r.len() != self.width);
        if found_h != self.height || found_w != self.width || bad_row {
            return Err(LoadError::SpriteDimensions {
                expected_w: self.width,
                expected_h: self.height,
                found_w,
                found_h,
            });
        }
        self.sprites = sprites.iter().flatten().copied().collect();
        Ok(self)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        let in_range = col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height;
        in_range.then(|| row as usize * self.width + col as usize)
    }

    /// Tile at (`col`, `row`); out-of-range is `Empty`.
    #[inline]
    pub fn get(&self, col: i32, row: i32) -> Tile {
        self.index(col, row).map_or(Tile::Empty, |i| self.tiles[i])
    }

    /// Edit a tile while building a level. Returns false when out of range.
    pub fn set(&mut self, col: i32, row: i32, tile: Tile) -> bool {
        match self.index(col, row) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    pub fn sprite(&self, col: i32, row: i32) -> Option<u16> {
        self.index(col, row).map(|i| self.sprites[i])
    }

    /// Tile (`col`, `row`) containing world point `p`.
    #[inline]
    pub fn world_to_tile(&self, p: Vec2) -> IVec2 {
        let cell = (p / self.tile_size).floor();
        IVec2::new(cell.x as i32, self.height as i32 - 1 - cell.y as i32)
    }

    /// World-space minimum corner of a tile.
    #[inline]
    pub fn tile_to_world(&self, col: i32, row: i32) -> Vec2 {
        let y_cell = self.height as i32 - 1 - row;
        Vec2::new(col as f32, y_cell as f32) * self.tile_size
    }

    pub fn tile_bounds(&self, col: i32, row: i32) -> Aabb {
        let min = self.tile_to_world(col, row);
        Aabb::from_min_max(min, min + Vec2::splat(self.tile_size))
    }

    /// Wall tiles as (`col`, `row`), row-major from the top.
    pub fn walls(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Tile::Wall)
            .map(|(i, _)| ((i % self.width) as i32, (i / self.width) as i32))
    }
}

impl SolidQuery for TileGrid {
    fn collides(&self, bounds: &Aabb) -> bool {
        let lo = self.world_to_tile(bounds.min());
        let hi = self.world_to_tile(bounds.max());
        // Higher world Y maps to a smaller row index
        let (row0, row1) = (hi.y.max(0), lo.y.min(self.height as i32 - 1));
        let (col0, col1) = (lo.x.max(0), hi.x.min(self.width as i32 - 1));
        for row in row0..=row1 {
            for col in col0..=col1 {
                if self.get(col, row) != Tile::Wall {
                    continue;
                }
                let cell = self.tile_bounds(col, row);
                if Narrowphase::overlap_box_box_minkowski(bounds, &cell).is_some() {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        TileGrid::from_rows(&["....", "#...", "####"], 8.0).unwrap()
    }

    #[test]
    fn test_world_tile_mapping_flips_y() {
        let g = grid();
        // Bottom row (row 2) covers y in [0, 8)
        assert_eq!(g.world_to_tile(Vec2::new(1.0, 1.0)), IVec2::new(0, 2));
        assert_eq!(g.world_to_tile(Vec2::new(9.0, 17.0)), IVec2::new(1, 0));
        assert_eq!(g.tile_to_world(0, 2), Vec2::ZERO);
        assert_eq!(g.tile_to_world(3, 0), Vec2::new(24.0, 16.0));
        let b = g.tile_bounds(0, 1);
        assert_eq!(b.min(), Vec2::new(0.0, 8.0));
        assert_eq!(b.max(), Vec2::new(8.0, 16.0));
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let g = grid();
        assert_eq!(g.get(0, 2), Tile::Wall);
        assert_eq!(g.get(-1, 2), Tile::Empty);
        assert_eq!(g.get(0, 3), Tile::Empty);
        assert_eq!(g.get(100, -100), Tile::Empty);
        assert!(!g.collides(&Aabb::new(Vec2::new(-50.0, 4.0), Vec2::splat(3.0))));
    }

    #[test]
    fn test_collides_is_strict_at_tile_edges() {
        let g = grid();
        // Resting exactly on the floor (top at y = 8)
        let standing = Aabb::new(Vec2::new(20.0, 10.0), Vec2::splat(2.0));
        assert!(!g.collides(&standing));
        let sunk = standing.translated(Vec2::new(0.0, -0.5));
        assert!(g.collides(&sunk));
        let beside = Aabb::new(Vec2::new(10.0, 12.0), Vec2::splat(2.0));
        assert!(!g.collides(&beside));
        assert!(g.collides(&beside.translated(Vec2::new(-1.0, 0.0))));
    }

    #[test]
    fn test_row_validation() {
        assert!(matches!(
            TileGrid::from_rows(&["...", ".."], 8.0),
            Err(LoadError::RowWidth { row: 1, expected: 3, found: 2 })
        ));
        assert!(matches!(
            TileGrid::from_rows(&["..x"], 8.0),
            Err(LoadError::UnknownTile { glyph: 'x', col: 2, row: 0 })
        ));
        assert!(matches!(TileGrid::from_rows::<&str>(&[], 8.0), Err(LoadError::EmptyGrid)));
        assert!(matches!(TileGrid::from_rows(&["#"], 0.0), Err(LoadError::TileSize(_))));
    }

    #[test]
    fn test_sprite_layer_dimensions() {
        let g = grid().with_sprites(&[vec![0, 0, 0, 0], vec![1, 0, 0, 0], vec![2, 2, 2, 2]]).unwrap();
        assert_eq!(g.sprite(0, 1), Some(1));
        assert_eq!(g.sprite(9, 9), None);
        assert!(matches!(grid().with_sprites(&[vec![0; 4]]), Err(LoadError::SpriteDimensions { .. })));
    }

    #[test]
    fn test_walls_iter() {
        let walls: Vec<_> = grid().walls().collect();
        assert_eq!(walls, vec![(0, 1), (0, 2), (1, 2), (2, 2), (3, 2)]);
    }
}
