use crate::browser;
use crate::config::{assets, net, rules};
use crate::engine::Point;
use crate::inventory::item::{Category, Frame, Item, ItemId};
use crate::inventory::placement::Layout;
use crate::inventory::registry::{Pool, Registry};
use crate::inventory::drag::Drag;
use crate::inventory::Inventory;
use crate::player::Player;
use crate::world::Cell;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// `player.json` as stored by the save server: every known player
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    #[serde(default)]
    pub playerlist: Vec<PlayerState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: u32,
    pub name: String,
    pub position: Cell,
    #[serde(default)]
    pub equipped: Vec<SavedItem>,
    /// items lying in the world, bottom of the z-order first
    #[serde(default)]
    pub items: Vec<SavedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: ItemId,
    pub name: String,
    pub category: Category,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<SavedItem>>,
}

/// Answer of `POST /playerdata`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

// where a fresh player starts
const START: Cell = Cell::new(10, 8);

impl SaveFile {
    pub fn find(&self, name: &str) -> Option<&PlayerState> {
        self.playerlist.iter().find(|player| player.name == name)
    }

    pub fn next_id(&self) -> u32 {
        self.playerlist
            .iter()
            .map(|player| player.id.saturating_add(1))
            .max()
            .unwrap_or(1)
    }

    /// Replaces the entry with the same id, or appends a new one
    pub fn upsert(&mut self, state: PlayerState) {
        match self.playerlist.iter_mut().find(|player| player.id == state.id) {
            Some(existing) => *existing = state,
            None => self.playerlist.push(state),
        }
    }
}

impl PlayerState {
    /// A player nobody has saved yet. Items come from the seeds, see
    /// [`Inventory::seeded`].
    pub fn new(id: u32, name: &str) -> Self {
        PlayerState {
            id,
            name: name.to_string(),
            position: START,
            equipped: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.equipped.is_empty() && self.items.is_empty()
    }

    /// `held` is the drag in progress, if any. The held item is saved where
    /// it was picked up since it follows the pointer in screen pixels.
    pub fn capture(id: u32, player: &Player, inventory: &Inventory, held: Option<Drag>) -> Self {
        let registry = inventory.registry();
        PlayerState {
            id,
            name: player.name().to_string(),
            position: player.cell(),
            equipped: registry
                .slots()
                .occupants()
                .filter_map(|id| saved(registry, id, held))
                .collect(),
            items: registry
                .world()
                .iter()
                .filter_map(|id| saved(registry, *id, held))
                .collect(),
        }
    }

    /// Rebuilds the registry. Entries whose id is already taken are skipped.
    pub fn restore(&self, layout: Layout) -> Inventory {
        let mut registry = Registry::new();
        for entry in &self.items {
            restore_item(&mut registry, entry, Pool::World, rules::WORLD_SCALE);
        }
        for entry in &self.equipped {
            let slot = entry.category;
            if restore_item(&mut registry, entry, Pool::Equipped(slot), rules::PANEL_SCALE) {
                registry.settle(entry.id, layout.slot_anchor(slot), rules::PANEL_SCALE);
            }
        }
        Inventory::new(registry, layout)
    }
}

fn saved(registry: &Registry, id: ItemId, held: Option<Drag>) -> Option<SavedItem> {
    let item = registry.get(id)?;
    let position = match held {
        Some(drag) if drag.item == id => drag.origin_position,
        _ => item.position(),
    };
    Some(SavedItem {
        id,
        name: item.name.clone(),
        category: item.category,
        position,
        contents: item.contents.as_ref().map(|contents| {
            contents
                .iter()
                .filter_map(|child| saved(registry, *child, held))
                .collect()
        }),
    })
}

fn restore_item(registry: &mut Registry, entry: &SavedItem, pool: Pool, scale: f32) -> bool {
    let mut item = Item::from_catalog(entry.id, &entry.name, entry.position)
        .filter(|item| item.category == entry.category)
        .unwrap_or_else(|| Item::new(entry.id, &entry.name, entry.category, Frame::default(), entry.position));
    item.sprite.scale = scale;
    if !registry.insert(item, pool) {
        return false;
    }
    for child in entry.contents.iter().flatten() {
        restore_item(registry, child, Pool::Contained(entry.id), rules::PANEL_SCALE);
    }
    true
}

pub async fn load() -> Result<SaveFile> {
    browser::fetch_json::<SaveFile>(assets::PLAYER_DATA)
        .await
        .with_context(|| format!("Failed to load player data from : {}", assets::PLAYER_DATA))
}

pub async fn save(file: &SaveFile) -> Result<SaveResponse> {
    let response: SaveResponse = browser::post_json(net::PLAYER_DATA_URL, file).await?;
    if !response.success {
        return Err(anyhow!("save refused : {}", response.message));
    }
    Ok(response)
}

/// Fire and forget: the page may be gone before the answer arrives
pub fn save_in_background(file: SaveFile) {
    browser::spawn_local(async move {
        match save(&file).await {
            Ok(response) => log!("saved player data : {}", response.message),
            Err(err) => error!("Error saving player data : {:#}", err),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::drag::{DragController, Scene};
    use crate::world::{TileKind, TileSource};
    use approx::assert_relative_eq;
    use serde_json::json;

    struct Floor;

    impl TileSource for Floor {
        fn tile_kind(&self, _: Cell) -> TileKind {
            TileKind::Floor
        }
    }

    fn world_item(registry: &mut Registry, name: &str, cell: Cell) -> ItemId {
        let id = registry.allocate_id();
        assert!(registry.add_item(Item::from_catalog(id, name, cell.origin()).unwrap()));
        id
    }

    #[test]
    fn wire_shape() {
        let state = PlayerState {
            id: 3,
            name: "ada".to_string(),
            position: Cell::new(4, 5),
            equipped: vec![SavedItem {
                id: ItemId(1),
                name: "backpack".to_string(),
                category: Category::Back,
                position: Point::new(848.0, 16.0),
                contents: Some(vec![]),
            }],
            items: vec![SavedItem {
                id: ItemId(2),
                name: "sword".to_string(),
                category: Category::Mainhand,
                position: Point::new(64.0, 128.0),
                contents: None,
            }],
        };
        let file = SaveFile {
            playerlist: vec![state],
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({
                "playerlist": [{
                    "id": 3,
                    "name": "ada",
                    "position": { "column": 4, "row": 5 },
                    "equipped": [{
                        "id": 1,
                        "name": "backpack",
                        "category": "back",
                        "position": { "x": 848.0, "y": 16.0 },
                        "contents": []
                    }],
                    "items": [{
                        "id": 2,
                        "name": "sword",
                        "category": "mainhand",
                        "position": { "x": 64.0, "y": 128.0 }
                    }]
                }]
            })
        );
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let file: SaveFile = serde_json::from_value(json!({
            "playerlist": [{ "id": 1, "name": "bo", "position": { "column": 0, "row": 0 } }]
        }))
        .unwrap();
        assert!(file.playerlist[0].is_fresh());
        let empty: SaveFile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.next_id(), 1);
    }

    #[test]
    fn save_response_decodes() {
        let response: SaveResponse =
            serde_json::from_value(json!({ "success": false, "message": "Failed to save player data." })).unwrap();
        assert!(!response.success);
        assert_eq!(response.message, "Failed to save player data.");
    }

    #[test]
    fn capture_then_restore_keeps_every_pool() {
        let layout = Layout::default();
        let mut registry = Registry::new();
        let backpack = world_item(&mut registry, "backpack", Cell::new(1, 1));
        let pouch = world_item(&mut registry, "pouch", Cell::new(1, 2));
        let amulet = world_item(&mut registry, "amulet", Cell::new(1, 3));
        let sword = world_item(&mut registry, "sword", Cell::new(2, 2));
        let spear = world_item(&mut registry, "spear", Cell::new(3, 3));
        assert!(registry.move_item(pouch, Pool::World, Pool::Contained(backpack)));
        assert!(registry.move_item(amulet, Pool::World, Pool::Contained(pouch)));
        let mut inventory = Inventory::new(registry, layout);
        inventory.equip(backpack, Cell::new(1, 1).origin()).unwrap();
        inventory.equip(sword, Cell::new(2, 2).origin()).unwrap();

        let player = Player::new("ada", Cell::new(7, 7));
        let state = PlayerState::capture(9, &player, &inventory, None);
        assert_eq!(state.position, Cell::new(7, 7));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.equipped.len(), 2);

        let restored = state.restore(layout);
        let registry = restored.registry();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.owner(spear), Some(Pool::World));
        assert_eq!(registry.owner(sword), Some(Pool::Equipped(Category::Mainhand)));
        assert_eq!(registry.owner(backpack), Some(Pool::Equipped(Category::Back)));
        assert_eq!(registry.owner(amulet), Some(Pool::Contained(pouch)));
        let sword = registry.get(sword).unwrap();
        assert_eq!(sword.position(), layout.slot_anchor(Category::Mainhand));
        assert_relative_eq!(sword.sprite.scale, 0.5);
        assert_relative_eq!(registry.get(spear).unwrap().sprite.scale, 1.0);
        registry.assert_consistent();
    }

    #[test]
    fn held_item_is_saved_where_it_was_picked_up() {
        let layout = Layout::default();
        let mut registry = Registry::new();
        let sword = world_item(&mut registry, "sword", Cell::new(11, 8));
        let mut inventory = Inventory::new(registry, layout);
        let player = Player::new("ada", Cell::new(10, 8));
        let scene = Scene {
            tiles: &Floor,
            player: player.cell(),
            inventory_mode: true,
        };

        let mut controller = DragController::new();
        let grab = Cell::new(11, 8).origin() - layout.camera(player.cell()) + Point::new(5.0, 5.0);
        assert!(controller.pointer_down(&mut inventory, &scene, grab));
        controller.pointer_move(&mut inventory, Point::new(40.0, 40.0));

        let state = PlayerState::capture(1, &player, &inventory, controller.held());
        assert_eq!(state.items[0].position, Point::new(704.0, 512.0));
        let restored = state.restore(layout);
        let sword = restored.registry().get(sword).unwrap();
        assert_eq!(Cell::containing(sword.position()), Cell::new(11, 8));
        assert!(!sword.is_dragging);
    }

    #[test]
    fn restore_skips_duplicate_ids() {
        let state = PlayerState {
            equipped: vec![SavedItem {
                id: ItemId(4),
                name: "helmet".to_string(),
                category: Category::Head,
                position: Point::default(),
                contents: None,
            }],
            items: vec![SavedItem {
                id: ItemId(4),
                name: "boots".to_string(),
                category: Category::Feet,
                position: Point::default(),
                contents: None,
            }],
            ..PlayerState::new(1, "ada")
        };
        let restored = state.restore(Layout::default());
        // the duplicate id loses, world items are restored first
        assert_eq!(restored.registry().len(), 1);
        assert_eq!(restored.registry().get(ItemId(4)).unwrap().name, "boots");
    }

    #[test]
    fn unknown_names_survive_a_restore() {
        let state = PlayerState {
            items: vec![SavedItem {
                id: ItemId(1),
                name: "lantern".to_string(),
                category: Category::Offhand,
                position: Point::new(64.0, 64.0),
                contents: None,
            }],
            ..PlayerState::new(1, "ada")
        };
        let restored = state.restore(Layout::default());
        let lantern = restored.registry().get(ItemId(1)).unwrap();
        assert_eq!(lantern.category, Category::Offhand);
        assert_eq!(lantern.sprite.frame, Frame::default());
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut file = SaveFile::default();
        file.upsert(PlayerState::new(1, "ada"));
        file.upsert(PlayerState::new(2, "bo"));
        let mut moved = PlayerState::new(1, "ada");
        moved.position = Cell::new(1, 1);
        file.upsert(moved);
        assert_eq!(file.playerlist.len(), 2);
        assert_eq!(file.find("ada").unwrap().position, Cell::new(1, 1));
        assert_eq!(file.next_id(), 3);
    }

    #[test]
    fn next_id_saturates_at_the_largest_id() {
        let mut file = SaveFile::default();
        file.upsert(PlayerState::new(u32::MAX, "ada"));
        assert_eq!(file.next_id(), u32::MAX);
    }
}
