use crate::config::{rules, tiles};
use crate::engine::{Point, Rect, Renderer, Size};
use crate::world::Cell;
use serde::{Deserialize, Serialize};
use std::fmt;
use web_sys::HtmlImageElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Body location an item is worn on. Every category has exactly one
/// equipment slot of the same name, and only `Back` items carry contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Head,
    Chest,
    Legs,
    Neck,
    Mainhand,
    Offhand,
    Back,
    Feet,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Head,
        Category::Chest,
        Category::Legs,
        Category::Neck,
        Category::Mainhand,
        Category::Offhand,
        Category::Back,
        Category::Feet,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_container(self) -> bool {
        matches!(self, Category::Back)
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Head => "head",
            Category::Chest => "chest",
            Category::Legs => "legs",
            Category::Neck => "neck",
            Category::Mainhand => "mainhand",
            Category::Offhand => "offhand",
            Category::Back => "back",
            Category::Feet => "feet",
        }
    }
}

/// Top left corner of a frame in the item sprite sheet
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub sx: f32,
    pub sy: f32,
}

/// Drawing data shared by everything placed on the canvas.
/// - `position` : top left corner
/// - `size`     : side of the square frame in the sheet
/// - `scale`    : on screen size is `size * scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    pub position: Point,
    pub frame: Frame,
    pub size: f32,
    pub scale: f32,
}

impl Renderable {
    pub fn new(position: Point, frame: Frame) -> Self {
        Renderable {
            position,
            frame,
            size: tiles::SIZE,
            scale: rules::WORLD_SCALE,
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.position, Size::square(self.size * self.scale))
    }

    pub fn draw(&self, renderer: &Renderer, sheet: &HtmlImageElement, offset: Point) {
        renderer.draw_image(
            sheet,
            &Rect::new_from_x_y(self.frame.sx, self.frame.sy, self.size, self.size),
            &self.bounding_box().translated(offset),
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub category: Category,
    pub name: String,
    pub sprite: Renderable,
    /// `Some` exactly for containers, ordered as shown in the grid
    pub contents: Option<Vec<ItemId>>,
    pub is_dragging: bool,
}

impl Item {
    pub fn new(id: ItemId, name: &str, category: Category, frame: Frame, position: Point) -> Self {
        Item {
            id,
            category,
            name: name.to_string(),
            sprite: Renderable::new(position, frame),
            contents: category.is_container().then(Vec::new),
            is_dragging: false,
        }
    }

    /// Builds the catalog item called `name`, `None` for unknown names
    pub fn from_catalog(id: ItemId, name: &str, position: Point) -> Option<Self> {
        catalog_entry(name).map(|entry| Item::new(id, entry.name, entry.category, entry.frame, position))
    }

    pub fn is_container(&self) -> bool {
        self.contents.is_some()
    }

    pub fn position(&self) -> Point {
        self.sprite.position
    }

    pub fn bounding_box(&self) -> Rect {
        self.sprite.bounding_box()
    }

    pub fn draw(&self, renderer: &Renderer, sheet: &HtmlImageElement, offset: Point) {
        self.sprite.draw(renderer, sheet, offset);
    }
}

// ==================== Catalog ====================

pub struct CatalogEntry {
    pub name: &'static str,
    pub category: Category,
    pub frame: Frame,
}

const fn entry(name: &'static str, category: Category, sx: f32, sy: f32) -> CatalogEntry {
    CatalogEntry {
        name,
        category,
        frame: Frame { sx, sy },
    }
}

pub const CATALOG: &[CatalogEntry] = &[
    entry("helmet", Category::Head, 0.0, 0.0),
    entry("chestplate", Category::Chest, 64.0, 0.0),
    entry("leggings", Category::Legs, 128.0, 0.0),
    entry("amulet", Category::Neck, 192.0, 0.0),
    entry("sword", Category::Mainhand, 0.0, 64.0),
    entry("spear", Category::Mainhand, 64.0, 64.0),
    entry("shield", Category::Offhand, 128.0, 64.0),
    entry("boots", Category::Feet, 192.0, 64.0),
    entry("backpack", Category::Back, 0.0, 128.0),
    entry("pouch", Category::Back, 64.0, 128.0),
    entry("satchel", Category::Back, 128.0, 128.0),
];

pub fn catalog_entry(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.name == name)
}

/// Where a fresh game puts its items
pub enum Seed {
    World(Cell),
    /// inside the container seeded under that name
    Inside(&'static str),
}

pub const SEEDS: &[(&str, Seed)] = &[
    ("backpack", Seed::World(Cell::new(11, 9))),
    ("pouch", Seed::Inside("backpack")),
    ("amulet", Seed::Inside("pouch")),
    ("sword", Seed::World(Cell::new(11, 8))),
    ("spear", Seed::World(Cell::new(9, 8))),
    ("helmet", Seed::World(Cell::new(10, 9))),
    ("chestplate", Seed::World(Cell::new(12, 8))),
    ("leggings", Seed::World(Cell::new(8, 8))),
    ("shield", Seed::World(Cell::new(11, 7))),
    ("boots", Seed::World(Cell::new(10, 7))),
    ("satchel", Seed::World(Cell::new(9, 9))),
];
