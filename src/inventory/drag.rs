use super::equipment::Swap;
use super::item::ItemId;
use super::placement::Zone;
use super::registry::{Layer, Pool};
use super::{Inventory, Revert};
use crate::config::rules;
use crate::engine::Point;
use crate::world::{Cell, TileKind, TileSource};

/// An item held under the pointer.
/// `origin_position` is in the coordinates of `origin`: world pixels for
/// world items, screen pixels for panel items. While dragged the item itself
/// is positioned in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub item: ItemId,
    pub origin: Pool,
    pub origin_position: Point,
    grab_offset: Point,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(Drag),
}

/// How a drag ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    Placed { item: ItemId, cell: Cell },
    Equipped { item: ItemId, evicted: Option<ItemId> },
    Contained { item: ItemId, container: ItemId },
    Destroyed { item: ItemId },
    Reverted { item: ItemId, reason: Revert },
}

/// What the controller needs to know about the world around the inventory
pub struct Scene<'a> {
    pub tiles: &'a dyn TileSource,
    pub player: Cell,
    pub inventory_mode: bool,
}

/// ┌────────────────── Drag and Drop ──────────────────────────────┐
/// │  Idle ── pointer_down on a grabbable item ──▶ Dragging        │
/// │  Dragging ── pointer_move ──▶ Dragging (item follows)         │
/// │  Dragging ── pointer_up ──▶ Idle, with one of                 │
/// │     world floor   → Placed       world water → Destroyed      │
/// │     world wall    → Reverted     equipment   → Equipped       │
/// │     open grid     → Contained    nowhere     → Reverted       │
/// └───────────────────────────────────────────────────────────────┘
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        DragController::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn held(&self) -> Option<Drag> {
        match self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    pub fn dragged(&self) -> Option<ItemId> {
        self.held().map(|drag| drag.item)
    }

    /// Picks up the item under `at` (screen pixels). Returns whether a drag
    /// started.
    pub fn pointer_down(&mut self, inventory: &mut Inventory, scene: &Scene, at: Point) -> bool {
        if !scene.inventory_mode || self.dragged().is_some() {
            return false;
        }
        let layout = *inventory.layout();
        let camera = layout.camera(scene.player);
        let found = match layout.classify(at, inventory.view().active_level()) {
            Zone::World => inventory
                .registry()
                .find_at_point(layout.to_world(at, camera), Layer::World)
                .filter(|id| in_reach(inventory, *id, scene.player)),
            Zone::EquipmentPanel => inventory.registry().find_at_point(at, Layer::Equipment),
            Zone::InventoryPanel(_) => inventory
                .view()
                .active()
                .and_then(|open| inventory.registry().find_at_point(at, Layer::Container(open))),
            Zone::None => None,
        };
        let Some(item) = found else {
            return false;
        };
        let (Some(origin), Some(origin_position)) = (
            inventory.registry().owner(item),
            inventory.registry().get(item).map(|item| item.position()),
        ) else {
            return false;
        };

        let on_screen = match origin {
            Pool::World => origin_position - camera,
            _ => origin_position,
        };
        inventory.lift(item);
        inventory.drag_to(item, on_screen);
        self.state = DragState::Dragging(Drag {
            item,
            origin,
            origin_position,
            grab_offset: at - on_screen,
        });
        true
    }

    pub fn pointer_move(&mut self, inventory: &mut Inventory, at: Point) {
        if let DragState::Dragging(drag) = self.state {
            inventory.drag_to(drag.item, at - drag.grab_offset);
        }
    }

    /// Drops the dragged item at `at` (screen pixels). `None` when nothing
    /// was being dragged.
    pub fn pointer_up(&mut self, inventory: &mut Inventory, scene: &Scene, at: Point) -> Option<DropOutcome> {
        let DragState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return None;
        };
        let item = drag.item;
        let layout = *inventory.layout();
        let camera = layout.camera(scene.player);

        let result = match layout.classify(at, inventory.view().active_level()) {
            Zone::World => {
                let cell = layout.snap(at, camera);
                match scene.tiles.tile_kind(cell) {
                    TileKind::Water => inventory
                        .destroy(item)
                        .map(|_| DropOutcome::Destroyed { item }),
                    TileKind::Boundary => Err(Revert::Boundary),
                    TileKind::Floor => inventory
                        .place_in_world(item, cell.origin())
                        .map(|_| DropOutcome::Placed { item, cell }),
                }
            }
            Zone::EquipmentPanel => {
                // a swapped out item lands where the new one came from
                let former = match drag.origin {
                    Pool::World => drag.origin_position,
                    _ => scene.player.origin(),
                };
                inventory
                    .equip(item, former)
                    .map(|Swap { evicted, .. }| DropOutcome::Equipped { item, evicted })
            }
            Zone::InventoryPanel(_) => inventory
                .stow(item)
                .map(|container| DropOutcome::Contained { item, container }),
            Zone::None => Err(Revert::NoZone),
        };

        Some(result.unwrap_or_else(|reason| {
            inventory.settle(item, drag.origin_position);
            DropOutcome::Reverted { item, reason }
        }))
    }
}

fn in_reach(inventory: &Inventory, id: ItemId, player: Cell) -> bool {
    inventory
        .registry()
        .get(id)
        .is_some_and(|item| Cell::containing(item.position()).distance(player) <= rules::INTERACTION_RANGE)
}
