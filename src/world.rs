use crate::config::tiles;
use crate::engine::{Point, Rect, Renderer};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use web_sys::HtmlImageElement;

/// Position on the tile grid, in whole tiles
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub column: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(column: i32, row: i32) -> Self {
        Cell { column, row }
    }

    /// Cell owning `point`. Cells are half open: a point on the shared edge
    /// of two cells belongs to the right/lower one.
    pub fn containing(point: Point) -> Self {
        Cell {
            column: (point.x / tiles::SIZE).floor() as i32,
            row: (point.y / tiles::SIZE).floor() as i32,
        }
    }

    /// top left corner in world pixels
    pub fn origin(&self) -> Point {
        Point::new(self.column as f32 * tiles::SIZE, self.row as f32 * tiles::SIZE)
    }

    pub fn offset(&self, columns: i32, rows: i32) -> Cell {
        Cell::new(self.column + columns, self.row + rows)
    }

    /// king-move distance, the range metric for picking items up
    pub fn distance(&self, other: Cell) -> i32 {
        (self.column - other.column)
            .abs()
            .max((self.row - other.row).abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    /// walls, trees and everything else that blocks movement and drops
    Boundary,
    /// destroys whatever is dropped into it
    Water,
}

/// What the drag/drop rules need to know about the map
pub trait TileSource {
    fn tile_kind(&self, cell: Cell) -> TileKind;
}

/// Map data as delivered by `map.json`.
/// Tiles are stored row major; `boundary` and `water` list the tile ids
/// belonging to those kinds, anything else is floor.
#[derive(Debug, Clone, Deserialize)]
pub struct TileMap {
    columns: i32,
    rows: i32,
    tiles: Vec<u16>,
    #[serde(default)]
    boundary: Vec<u16>,
    #[serde(default)]
    water: Vec<u16>,
}

impl TileMap {
    pub fn new(columns: i32, rows: i32, tiles: Vec<u16>, boundary: Vec<u16>, water: Vec<u16>) -> Result<Self> {
        TileMap {
            columns,
            rows,
            tiles,
            boundary,
            water,
        }
        .validated()
    }

    /// Rejects maps whose tile list does not cover the declared grid
    pub fn validated(self) -> Result<Self> {
        if self.columns <= 0 || self.rows <= 0 {
            return Err(anyhow!("TileMap: empty grid {}x{}", self.columns, self.rows));
        }
        let expected = (self.columns * self.rows) as usize;
        if self.tiles.len() != expected {
            return Err(anyhow!(
                "TileMap: {} tiles for a {}x{} grid (expected {})",
                self.tiles.len(),
                self.columns,
                self.rows,
                expected
            ));
        }
        Ok(self)
    }

    pub fn tile(&self, cell: Cell) -> Option<u16> {
        if cell.column < 0 || cell.row < 0 || cell.column >= self.columns || cell.row >= self.rows {
            return None;
        }
        self.tiles
            .get((cell.row * self.columns + cell.column) as usize)
            .copied()
    }

    /// Source rectangle of a tile id in the map sprite sheet
    pub fn frame(id: u16) -> Rect {
        Rect::new_from_x_y(
            (id % tiles::SHEET_COLUMNS) as f32 * tiles::SIZE,
            (id / tiles::SHEET_COLUMNS) as f32 * tiles::SIZE,
            tiles::SIZE,
            tiles::SIZE,
        )
    }

    /// Draws the tiles visible through the viewport whose top left world
    /// pixel is `camera`.
    pub fn draw(&self, renderer: &Renderer, sheet: &HtmlImageElement, camera: Point) {
        let first = Cell::containing(camera);
        for row in 0..=tiles::VIEW_ROWS {
            for column in 0..=tiles::VIEW_COLUMNS {
                let cell = first.offset(column, row);
                if let Some(id) = self.tile(cell) {
                    let destination = Rect::new_from_x_y(
                        cell.origin().x - camera.x,
                        cell.origin().y - camera.y,
                        tiles::SIZE,
                        tiles::SIZE,
                    );
                    renderer.draw_image(sheet, &TileMap::frame(id), &destination);
                }
            }
        }
    }
}

impl TileSource for TileMap {
    fn tile_kind(&self, cell: Cell) -> TileKind {
        match self.tile(cell) {
            None => TileKind::Boundary,
            Some(id) if self.water.contains(&id) => TileKind::Water,
            Some(id) if self.boundary.contains(&id) => TileKind::Boundary,
            Some(_) => TileKind::Floor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRASS: u16 = 0;
    const WALL: u16 = 7;
    const LAKE: u16 = 12;

    fn map() -> TileMap {
        #[rustfmt::skip]
        let tiles = vec![
            WALL, WALL,  WALL,
            WALL, GRASS, LAKE,
            WALL, GRASS, GRASS,
        ];
        TileMap::new(3, 3, tiles, vec![WALL], vec![LAKE]).unwrap()
    }

    #[test]
    fn classifies_tiles() {
        let map = map();
        assert_eq!(map.tile_kind(Cell::new(1, 1)), TileKind::Floor);
        assert_eq!(map.tile_kind(Cell::new(2, 1)), TileKind::Water);
        assert_eq!(map.tile_kind(Cell::new(0, 2)), TileKind::Boundary);
    }

    #[test]
    fn outside_the_map_is_boundary() {
        let map = map();
        assert_eq!(map.tile_kind(Cell::new(-1, 1)), TileKind::Boundary);
        assert_eq!(map.tile_kind(Cell::new(3, 1)), TileKind::Boundary);
        assert_eq!(map.tile_kind(Cell::new(1, 3)), TileKind::Boundary);
    }

    #[test]
    fn rejects_short_tile_list() {
        assert!(TileMap::new(2, 2, vec![GRASS; 3], vec![], vec![]).is_err());
    }

    #[test]
    fn snapping_is_half_open() {
        assert_eq!(Cell::containing(Point::new(0.0, 0.0)), Cell::new(0, 0));
        assert_eq!(Cell::containing(Point::new(63.9, 63.9)), Cell::new(0, 0));
        assert_eq!(Cell::containing(Point::new(64.0, 64.0)), Cell::new(1, 1));
        assert_eq!(Cell::containing(Point::new(-0.5, 10.0)), Cell::new(-1, 0));
    }

    #[test]
    fn distance_is_chebyshev() {
        let here = Cell::new(4, 4);
        assert_eq!(here.distance(Cell::new(5, 5)), 1);
        assert_eq!(here.distance(Cell::new(4, 6)), 2);
        assert_eq!(here.distance(here), 0);
    }

    #[test]
    fn sheet_frames_wrap_rows() {
        let frame = TileMap::frame(tiles::SHEET_COLUMNS + 2);
        assert_eq!(frame.position, Point::new(128.0, 64.0));
    }
}
