// ┌──────────────────────────────────────────────────────────────────────┐
// │                        Inventory Module Map                          │
// ├──────────────────┬───────────────────────────────────────────────────┤
// │ placement.rs     │ which zone a screen point falls in (pure)         │
// │ item.rs          │ Item, Category, catalog                           │
// │ registry.rs      │ pools + the single owner rule                     │
// │ equipment.rs     │ slot rules: category check, swap, rescale         │
// │ container.rs     │ open container levels (Closed/Primary/Both)       │
// │ drag.rs          │ pointer driven moves between all of the above     │
// │ mod.rs           │ Inventory: glues registry and view together and   │
// │                  │ runs the cascades between them                    │
// └──────────────────┴───────────────────────────────────────────────────┘
pub mod container;
pub mod drag;
pub mod equipment;
pub mod item;
pub mod placement;
pub mod registry;

use self::container::{ContainerEvent, ContainerView};
use self::equipment::Swap;
use self::item::{Category, Item, ItemId, Seed, SEEDS};
use self::placement::{Layout, Zone};
use self::registry::{Layer, Pool, Registry};
use crate::config::rules;
use crate::engine::Point;
use std::collections::HashMap;

/// Why a move was refused. Refusals are ordinary outcomes: the item simply
/// stays where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revert {
    /// dropped outside every zone
    NoZone,
    /// dropped on a wall or off the map
    Boundary,
    CategoryMismatch,
    /// dropped back where it came from
    AlreadyThere,
    EmptySlot,
    NoContainerOpen,
    ContainerFull,
    /// a container cannot go inside itself
    WouldNest,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Opened(ItemId),
    Closed,
    Ignored,
}

pub struct Inventory {
    registry: Registry,
    view: ContainerView,
    layout: Layout,
}

impl Inventory {
    pub fn new(registry: Registry, layout: Layout) -> Self {
        Inventory {
            registry,
            view: ContainerView::Closed,
            layout,
        }
    }

    /// Fresh game: every catalog seed at its starting place
    pub fn seeded(layout: Layout) -> Self {
        let mut registry = Registry::new();
        let mut placed: HashMap<&str, ItemId> = HashMap::new();
        for (name, seed) in SEEDS {
            let (position, pool) = match seed {
                Seed::World(cell) => (cell.origin(), Pool::World),
                Seed::Inside(parent) => match placed.get(parent) {
                    Some(parent) => (Point::default(), Pool::Contained(*parent)),
                    None => continue,
                },
            };
            let id = registry.allocate_id();
            if let Some(item) = Item::from_catalog(id, name, position) {
                if registry.insert(item, pool) {
                    placed.insert(*name, id);
                }
            }
        }
        Inventory::new(registry, layout)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn view(&self) -> ContainerView {
        self.view
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// What the grid shows: contents of the deepest open container
    pub fn displayed(&self) -> &[ItemId] {
        match self.view.active() {
            Some(container) => self.registry.contents(container),
            None => &[],
        }
    }

    /// Opens the equipped back item, or a container shown in the grid.
    /// Anything else, including the container already on top, is ignored.
    pub fn open_container(&mut self, id: ItemId) -> bool {
        if !self.registry.get(id).is_some_and(Item::is_container) {
            return false;
        }
        let reachable = match (self.view.active(), self.registry.owner(id)) {
            (None, Some(Pool::Equipped(Category::Back))) => true,
            (Some(open), Some(Pool::Contained(parent))) => parent == open,
            _ => false,
        };
        if !reachable {
            return false;
        }
        let before = self.view;
        self.view = self.view.transition(ContainerEvent::Open(id));
        self.arrange();
        self.view != before
    }

    pub fn close_top(&mut self) -> bool {
        let before = self.view;
        self.view = self.view.transition(ContainerEvent::CloseTop);
        self.arrange();
        self.view != before
    }

    /// Right click: open the container under the pointer, or close the top
    /// level when clicking empty grid space
    pub fn navigate(&mut self, at: Point) -> Navigation {
        let (target, on_grid) = match self.layout.classify(at, self.view.active_level()) {
            Zone::EquipmentPanel => (self.registry.find_at_point(at, Layer::Equipment), false),
            Zone::InventoryPanel(_) => match self.view.active() {
                Some(open) => (self.registry.find_at_point(at, Layer::Container(open)), true),
                None => return Navigation::Ignored,
            },
            Zone::World | Zone::None => return Navigation::Ignored,
        };
        match target {
            Some(id) if self.open_container(id) => Navigation::Opened(id),
            None if on_grid && self.close_top() => Navigation::Closed,
            _ => Navigation::Ignored,
        }
    }

    /// Wears `id` in the slot of its category. `former` is where a swapped
    /// out item lands in the world.
    pub fn equip(&mut self, id: ItemId, former: Point) -> Result<Swap, Revert> {
        let slot = self.registry.get(id).ok_or(Revert::Unknown)?.category;
        let swap = equipment::equip(&mut self.registry, id, slot, self.layout.slot_anchor(slot), former)?;
        if slot == Category::Back {
            self.view = self.view.transition(ContainerEvent::EquipBack {
                previous: swap.evicted,
            });
        }
        self.release(id);
        self.arrange();
        Ok(swap)
    }

    /// Empties `slot`, laying the item in the world at `at` (world pixels)
    pub fn unequip(&mut self, slot: Category, at: Point) -> Result<ItemId, Revert> {
        let id = equipment::unequip(&mut self.registry, slot, at)?;
        if slot == Category::Back {
            self.view = self.view.transition(ContainerEvent::UnequipBack(id));
        }
        self.arrange();
        Ok(id)
    }

    /// Lays `id` in the world at `at` (world pixels), from whichever pool it
    /// is in
    pub fn place_in_world(&mut self, id: ItemId, at: Point) -> Result<(), Revert> {
        match self.registry.owner(id).ok_or(Revert::Unknown)? {
            Pool::Equipped(slot) => {
                self.unequip(slot, at)?;
            }
            Pool::World => self.registry.raise(id),
            from @ Pool::Contained(_) => {
                if !self.registry.move_item(id, from, Pool::World) {
                    return Err(Revert::Unknown);
                }
            }
        }
        self.registry.settle(id, at, rules::WORLD_SCALE);
        self.release(id);
        self.arrange();
        Ok(())
    }

    /// Appends `id` to the container the grid shows
    pub fn stow(&mut self, id: ItemId) -> Result<ItemId, Revert> {
        let container = self.view.active().ok_or(Revert::NoContainerOpen)?;
        let from = self.registry.owner(id).ok_or(Revert::Unknown)?;
        if from == Pool::Contained(container) {
            return Err(Revert::AlreadyThere);
        }
        if container == id || self.registry.is_within(container, id) {
            return Err(Revert::WouldNest);
        }
        if !self.registry.move_item(id, from, Pool::Contained(container)) {
            return Err(Revert::ContainerFull);
        }
        if let Some(item) = self.registry.get_mut(id) {
            item.is_dragging = false;
        }
        self.release(id);
        self.arrange();
        Ok(container)
    }

    /// Removes `id` and everything inside it from every pool
    pub fn destroy(&mut self, id: ItemId) -> Result<(), Revert> {
        if !self.registry.contains(id) {
            return Err(Revert::Unknown);
        }
        // ancestry is gone once removed, so close views first
        self.release(id);
        self.registry.remove_item(id).ok_or(Revert::Unknown)?;
        self.arrange();
        Ok(())
    }

    /// Marks `id` as dragged and brings it on top
    pub fn lift(&mut self, id: ItemId) {
        if let Some(item) = self.registry.get_mut(id) {
            item.is_dragging = true;
        }
        self.registry.raise(id);
    }

    pub fn drag_to(&mut self, id: ItemId, position: Point) {
        if let Some(item) = self.registry.get_mut(id) {
            item.sprite.position = position;
        }
    }

    /// Puts a dragged item back down at `position` without changing its pool
    pub fn settle(&mut self, id: ItemId, position: Point) {
        if let Some(item) = self.registry.get_mut(id) {
            item.sprite.position = position;
            item.is_dragging = false;
        }
    }

    /// Closes every open level showing `id` or something inside it
    fn release(&mut self, id: ItemId) {
        while let Some(top) = self.view.active() {
            if top != id && !self.registry.is_within(top, id) {
                break;
            }
            self.view = self.view.transition(ContainerEvent::Release(top));
        }
    }

    /// Lays the shown contents out on the grid
    fn arrange(&mut self) {
        let Some(container) = self.view.active() else {
            return;
        };
        let contents = self.registry.contents(container).to_vec();
        for (index, id) in contents.into_iter().enumerate() {
            let cell = self.layout.grid_cell(index);
            if let Some(item) = self.registry.get_mut(id) {
                if !item.is_dragging {
                    item.sprite.position = cell;
                    item.sprite.scale = rules::PANEL_SCALE;
                }
            }
        }
    }
}
