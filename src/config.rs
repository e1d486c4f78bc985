// ==================== Constants ====================
// Everything the game reads at startup lives here. Panel geometry is derived
// from these numbers by `inventory::placement::Layout`.

/// Canvas dimensions in pixels
pub mod canvas {
    pub const WIDTH: f32 = 1024.0;
    pub const HEIGHT: f32 = 704.0;
    /// Right hand column holding the equipment and inventory panels
    pub const SIDEBAR_WIDTH: f32 = 192.0;
}

/// Tile grid of the world viewport
pub mod tiles {
    pub const SIZE: f32 = 64.0;
    pub const VIEW_COLUMNS: i32 = 13;
    pub const VIEW_ROWS: i32 = 11;
    /// Frames per row in the map sprite sheet
    pub const SHEET_COLUMNS: u16 = 25;
    /// Screen cell the avatar is pinned to; the camera follows it
    pub const PLAYER_SCREEN_CELL: (i32, i32) = (6, 5);
}

/// Asset locations, relative to the page
pub mod assets {
    pub const MAP_DATA: &str = "assets/map_data/map.json";
    pub const MAP_SHEET: &str = "assets/map_data/spritesheet-genus.png";
    pub const PLAYER_DATA: &str = "assets/player_data/player.json";
    pub const PLAYER_SHEET: &str = "assets/player_data/player.png";
    pub const ITEM_SHEET: &str = "assets/item_data/items.png";
}

/// Save collaborator
pub mod net {
    pub const PLAYER_DATA_URL: &str = "http://localhost:4000/playerdata";
}

/// Interaction rules
pub mod rules {
    /// Chebyshev distance in tiles within which world items can be picked up
    pub const INTERACTION_RANGE: i32 = 1;
    /// Fixed updates between two avatar steps while an arrow key is held
    pub const MOVE_COOLDOWN: u8 = 12;
    /// Scale of items shown in the equipment panel and the inventory grid
    pub const PANEL_SCALE: f32 = 0.5;
    pub const WORLD_SCALE: f32 = 1.0;
}

/// Inventory grid inside the sidebar
pub mod grid {
    pub const COLUMNS: usize = 3;
    pub const ROWS: usize = 7;
    pub const CAPACITY: usize = COLUMNS * ROWS;
    /// Height of the equipment panel on top of the grid
    pub const EQUIPMENT_HEIGHT: f32 = 256.0;
}
