use thiserror::Error;

/// Load-time failures for levels, entity prototypes and world config.
///
/// Per-tick queries never produce these; malformed geometry must be rejected
/// when the level is loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The tile layer has no rows or no columns.
    #[error("tile layer is empty")]
    EmptyGrid,
    /// Tile size must be a positive, finite number of pixels.
    #[error("tile size must be positive and finite, got {0}")]
    TileSize(f32),
    /// A row's width disagrees with the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A glyph in the tile layer is not `#` or `.`.
    #[error("unknown tile glyph {glyph:?} at column {col}, row {row}")]
    UnknownTile { glyph: char, col: usize, row: usize },
    /// Sprite layer dimensions must match the tile layer.
    #[error("sprite layer is {found_w}x{found_h}, tile layer is {expected_w}x{expected_h}")]
    SpriteDimensions {
        expected_w: usize,
        expected_h: usize,
        found_w: usize,
        found_h: usize,
    },
    /// A static collider is degenerate or not finite.
    #[error("collider {index}: {reason}")]
    Collider { index: usize, reason: &'static str },
    /// A trigger zone is degenerate or not finite.
    #[error("zone {name:?}: {reason}")]
    Zone { name: String, reason: &'static str },
    /// An entity prototype has an unusable collider or tuning value.
    #[error("prototype {name:?}: {reason}")]
    Prototype { name: String, reason: &'static str },
    /// A world configuration value the fixed-step loop cannot use.
    #[error("world config: {0}")]
    Config(&'static str),
    /// Serialization/deserialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
