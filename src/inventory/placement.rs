use super::container::Level;
use super::item::Category;
use crate::config::{canvas, grid, rules, tiles};
use crate::engine::{Point, Rect};
use crate::world::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    World,
    EquipmentPanel,
    InventoryPanel(Level),
    None,
}

/// Screen regions, derived once from the canvas size.
///
/// ```text
/// ┌──────────────────────────┬──────────┐
/// │                          │equipment │
/// │          world           ├──────────┤
/// │  half open: [0, w) x     │inventory │
/// │            [0, h)        │  grid    │
/// │                          │          │
/// └──────────────────────────┴──────────┘
/// ```
/// Panels are hit tested with both edges inclusive and win over the world on
/// shared edges; the equipment panel wins over the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub world: Rect,
    pub equipment: Rect,
    pub inventory: Rect,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new(canvas::WIDTH, canvas::HEIGHT)
    }
}

impl Layout {
    pub fn new(width: f32, height: f32) -> Self {
        let sidebar_x = width - canvas::SIDEBAR_WIDTH;
        Layout {
            world: Rect::new_from_x_y(0.0, 0.0, sidebar_x, height),
            equipment: Rect::new_from_x_y(sidebar_x, 0.0, canvas::SIDEBAR_WIDTH, grid::EQUIPMENT_HEIGHT),
            inventory: Rect::new_from_x_y(
                sidebar_x,
                grid::EQUIPMENT_HEIGHT,
                canvas::SIDEBAR_WIDTH,
                height - grid::EQUIPMENT_HEIGHT,
            ),
        }
    }

    /// `open` is the level the grid currently shows; with nothing open the
    /// grid is not drawn and cannot be hit.
    pub fn classify(&self, point: Point, open: Option<Level>) -> Zone {
        if self.equipment.contains(point) {
            Zone::EquipmentPanel
        } else if self.inventory.contains(point) {
            open.map_or(Zone::None, Zone::InventoryPanel)
        } else if self.world.contains_half_open(point) {
            Zone::World
        } else {
            Zone::None
        }
    }

    /// Where an equipped item of `category` is drawn
    pub fn slot_anchor(&self, category: Category) -> Point {
        // paper doll: back head neck / main chest off / - legs - / - feet -
        let (column, row) = match category {
            Category::Back => (0, 0),
            Category::Head => (1, 0),
            Category::Neck => (2, 0),
            Category::Mainhand => (0, 1),
            Category::Chest => (1, 1),
            Category::Offhand => (2, 1),
            Category::Legs => (1, 2),
            Category::Feet => (1, 3),
        };
        Self::cell_anchor(self.equipment.position, column, row)
    }

    /// Where the `index`th item of the shown container is drawn
    pub fn grid_cell(&self, index: usize) -> Point {
        Self::cell_anchor(
            self.inventory.position,
            (index % grid::COLUMNS) as i32,
            (index / grid::COLUMNS) as i32,
        )
    }

    fn cell_anchor(origin: Point, column: i32, row: i32) -> Point {
        let inset = (tiles::SIZE - tiles::SIZE * rules::PANEL_SCALE) / 2.0;
        Point::new(
            origin.x + column as f32 * tiles::SIZE + inset,
            origin.y + row as f32 * tiles::SIZE + inset,
        )
    }

    /// World pixel shown at the top left of the viewport when the avatar
    /// stands on `player`
    pub fn camera(&self, player: Cell) -> Point {
        let (column, row) = tiles::PLAYER_SCREEN_CELL;
        player.offset(-column, -row).origin()
    }

    pub fn to_world(&self, screen: Point, camera: Point) -> Point {
        screen + camera
    }

    /// Tile cell under a screen point
    pub fn snap(&self, screen: Point, camera: Point) -> Cell {
        Cell::containing(self.to_world(screen, camera))
    }
}
