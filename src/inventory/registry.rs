use super::equipment::EquipmentSlots;
use super::item::{Category, Item, ItemId};
use crate::config::grid;
use crate::engine::Point;
use std::collections::HashMap;

/// The one place an item lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    World,
    Equipped(Category),
    Contained(ItemId),
}

/// What a pointer can hit, see [`Registry::find_at_point`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    World,
    Equipment,
    Container(ItemId),
}

/// Owns every item and the pools they belong to.
///
/// `owners` is the membership record; `world`, the equipment slots and each
/// container's `contents` are the ordered views of it. Both are only changed
/// together through `attach`/`detach`, so an item is always in exactly one
/// pool.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    items: HashMap<ItemId, Item>,
    owners: HashMap<ItemId, Pool>,
    /// z-order, last is drawn on top
    world: Vec<ItemId>,
    slots: EquipmentSlots,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn allocate_id(&mut self) -> ItemId {
        while self.items.contains_key(&ItemId(self.next_id)) {
            self.next_id += 1;
        }
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn owner(&self, id: ItemId) -> Option<Pool> {
        self.owners.get(&id).copied()
    }

    pub fn world(&self) -> &[ItemId] {
        &self.world
    }

    pub fn slots(&self) -> &EquipmentSlots {
        &self.slots
    }

    /// Contents of `container` in grid order; empty for anything else
    pub fn contents(&self, container: ItemId) -> &[ItemId] {
        self.items
            .get(&container)
            .and_then(|item| item.contents.as_deref())
            .unwrap_or(&[])
    }

    /// Places a new item in the world
    pub fn add_item(&mut self, item: Item) -> bool {
        self.insert(item, Pool::World)
    }

    /// Adds a new item to `pool`. Refused (false) for a duplicate id or a
    /// pool that cannot take it.
    pub fn insert(&mut self, item: Item, pool: Pool) -> bool {
        if self.items.contains_key(&item.id) || !self.accepts(pool, &item) {
            return false;
        }
        let id = item.id;
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.items.insert(id, item);
        self.attach(id, pool);
        true
    }

    /// Deletes the item and, for containers, everything inside it
    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        self.detach(id)?;
        let item = self.items.remove(&id)?;
        for child in item.contents.iter().flatten() {
            self.purge(*child);
        }
        Some(item)
    }

    fn purge(&mut self, id: ItemId) {
        self.owners.remove(&id);
        if let Some(item) = self.items.remove(&id) {
            for child in item.contents.into_iter().flatten() {
                self.purge(child);
            }
        }
    }

    /// Moves `id` from `from` to the end of `to`. Nothing changes (false) if
    /// `from` is not where the item is or `to` refuses it.
    pub fn move_item(&mut self, id: ItemId, from: Pool, to: Pool) -> bool {
        if self.owners.get(&id) != Some(&from) {
            return false;
        }
        if from == to {
            return true;
        }
        match self.items.get(&id) {
            Some(item) if self.accepts(to, item) => {}
            _ => return false,
        }
        self.detach(id);
        self.attach(id, to);
        true
    }

    /// Whether `pool` can take `item` right now
    pub fn accepts(&self, pool: Pool, item: &Item) -> bool {
        match pool {
            Pool::World => true,
            Pool::Equipped(slot) => item.category == slot && self.slots.get(slot).is_none(),
            Pool::Contained(container) => {
                container != item.id
                    && !self.is_within(container, item.id)
                    && self
                        .items
                        .get(&container)
                        .and_then(|c| c.contents.as_ref())
                        .is_some_and(|contents| contents.len() < grid::CAPACITY)
            }
        }
    }

    /// true if `id` sits, at any depth, inside `ancestor`
    pub fn is_within(&self, id: ItemId, ancestor: ItemId) -> bool {
        let mut current = id;
        while let Some(Pool::Contained(parent)) = self.owners.get(&current) {
            if *parent == ancestor {
                return true;
            }
            current = *parent;
        }
        false
    }

    /// Brings a world item to the top of the z-order
    pub fn raise(&mut self, id: ItemId) {
        if let Some(index) = self.world.iter().position(|other| *other == id) {
            let id = self.world.remove(index);
            self.world.push(id);
        }
    }

    /// Puts the item down: new position and scale, no longer dragged
    pub fn settle(&mut self, id: ItemId, position: Point, scale: f32) {
        if let Some(item) = self.items.get_mut(&id) {
            item.sprite.position = position;
            item.sprite.scale = scale;
            item.is_dragging = false;
        }
    }

    /// Topmost item of `layer` whose bounding box contains `point`.
    /// `point` is in world pixels for [`Layer::World`], screen pixels otherwise.
    pub fn find_at_point(&self, point: Point, layer: Layer) -> Option<ItemId> {
        let hit = |id: ItemId| {
            self.items
                .get(&id)
                .is_some_and(|item| item.bounding_box().contains(point))
        };
        match layer {
            Layer::World => self.world.iter().rev().copied().find(|id| hit(*id)),
            Layer::Equipment => self.slots.occupants().find(|id| hit(*id)),
            Layer::Container(container) => self.contents(container).iter().rev().copied().find(|id| hit(*id)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    fn detach(&mut self, id: ItemId) -> Option<Pool> {
        let pool = self.owners.remove(&id)?;
        match pool {
            Pool::World => self.world.retain(|other| *other != id),
            Pool::Equipped(slot) => self.slots.set(slot, None),
            Pool::Contained(container) => {
                if let Some(contents) = self.items.get_mut(&container).and_then(|c| c.contents.as_mut()) {
                    contents.retain(|other| *other != id);
                }
            }
        }
        Some(pool)
    }

    fn attach(&mut self, id: ItemId, pool: Pool) {
        match pool {
            Pool::World => self.world.push(id),
            Pool::Equipped(slot) => self.slots.set(slot, Some(id)),
            Pool::Contained(container) => {
                if let Some(contents) = self.items.get_mut(&container).and_then(|c| c.contents.as_mut()) {
                    contents.push(id);
                }
            }
        }
        self.owners.insert(id, pool);
    }

    /// Panics unless every item is listed by exactly one pool, and that pool
    /// is the one recorded as its owner.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut listed: HashMap<ItemId, Vec<Pool>> = HashMap::new();
        for id in &self.world {
            listed.entry(*id).or_default().push(Pool::World);
        }
        for (slot, occupant) in self.slots.iter() {
            if let Some(id) = occupant {
                listed.entry(id).or_default().push(Pool::Equipped(slot));
            }
        }
        for item in self.items.values() {
            for id in item.contents.iter().flatten() {
                listed.entry(*id).or_default().push(Pool::Contained(item.id));
            }
        }
        for id in self.items.keys() {
            let pools = listed.remove(id).unwrap_or_default();
            assert_eq!(pools.len(), 1, "{id} listed in {pools:?}");
            assert_eq!(self.owners.get(id), Some(&pools[0]), "{id} owner mismatch");
        }
        assert!(listed.is_empty(), "pools list unknown items {listed:?}");
        assert_eq!(self.owners.len(), self.items.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(registry: &mut Registry, name: &str, position: Point) -> ItemId {
        let id = registry.allocate_id();
        assert!(registry.add_item(Item::from_catalog(id, name, position).unwrap()));
        id
    }

    #[test]
    fn topmost_is_last_inserted() {
        let mut registry = Registry::new();
        let below = item(&mut registry, "sword", Point::new(0.0, 0.0));
        let above = item(&mut registry, "spear", Point::new(32.0, 32.0));

        assert_eq!(registry.find_at_point(Point::new(40.0, 40.0), Layer::World), Some(above));
        assert_eq!(registry.find_at_point(Point::new(10.0, 10.0), Layer::World), Some(below));
        assert_eq!(registry.find_at_point(Point::new(200.0, 10.0), Layer::World), None);

        registry.raise(below);
        assert_eq!(registry.find_at_point(Point::new(40.0, 40.0), Layer::World), Some(below));
        registry.assert_consistent();
    }

    #[test]
    fn hit_box_includes_far_edge() {
        let mut registry = Registry::new();
        let sword = item(&mut registry, "sword", Point::new(0.0, 0.0));
        assert_eq!(registry.find_at_point(Point::new(64.0, 64.0), Layer::World), Some(sword));
    }

    #[test]
    fn move_requires_the_current_owner() {
        let mut registry = Registry::new();
        let backpack = item(&mut registry, "backpack", Point::default());
        let sword = item(&mut registry, "sword", Point::default());

        assert!(!registry.move_item(sword, Pool::Contained(backpack), Pool::World));
        assert!(registry.move_item(sword, Pool::World, Pool::Contained(backpack)));
        assert_eq!(registry.owner(sword), Some(Pool::Contained(backpack)));
        assert_eq!(registry.contents(backpack), &[sword]);
        assert_eq!(registry.world(), &[backpack]);
        registry.assert_consistent();
    }

    #[test]
    fn slots_take_only_their_category() {
        let mut registry = Registry::new();
        let sword = item(&mut registry, "sword", Point::default());
        assert!(!registry.move_item(sword, Pool::World, Pool::Equipped(Category::Head)));
        assert!(registry.move_item(sword, Pool::World, Pool::Equipped(Category::Mainhand)));

        let spear = item(&mut registry, "spear", Point::default());
        assert!(!registry.move_item(spear, Pool::World, Pool::Equipped(Category::Mainhand)));
        registry.assert_consistent();
    }

    #[test]
    fn containers_cannot_swallow_themselves() {
        let mut registry = Registry::new();
        let backpack = item(&mut registry, "backpack", Point::default());
        let pouch = item(&mut registry, "pouch", Point::default());
        assert!(!registry.move_item(backpack, Pool::World, Pool::Contained(backpack)));
        assert!(registry.move_item(pouch, Pool::World, Pool::Contained(backpack)));
        assert!(registry.is_within(pouch, backpack));
        assert!(!registry.move_item(backpack, Pool::World, Pool::Contained(pouch)));
        registry.assert_consistent();
    }

    #[test]
    fn only_containers_have_contents() {
        let mut registry = Registry::new();
        let sword = item(&mut registry, "sword", Point::default());
        let spear = item(&mut registry, "spear", Point::default());
        assert!(!registry.move_item(spear, Pool::World, Pool::Contained(sword)));
        assert!(registry.contents(sword).is_empty());
    }

    #[test]
    fn full_container_refuses() {
        let mut registry = Registry::new();
        let backpack = item(&mut registry, "backpack", Point::default());
        for _ in 0..grid::CAPACITY {
            let id = registry.allocate_id();
            let boots = Item::from_catalog(id, "boots", Point::default()).unwrap();
            assert!(registry.insert(boots, Pool::Contained(backpack)));
        }
        let extra = item(&mut registry, "helmet", Point::default());
        assert!(!registry.move_item(extra, Pool::World, Pool::Contained(backpack)));
        registry.assert_consistent();
    }

    #[test]
    fn removing_a_container_removes_its_contents() {
        let mut registry = Registry::new();
        let backpack = item(&mut registry, "backpack", Point::default());
        let pouch = item(&mut registry, "pouch", Point::default());
        let amulet = item(&mut registry, "amulet", Point::default());
        let sword = item(&mut registry, "sword", Point::default());
        assert!(registry.move_item(pouch, Pool::World, Pool::Contained(backpack)));
        assert!(registry.move_item(amulet, Pool::World, Pool::Contained(pouch)));

        let removed = registry.remove_item(backpack).unwrap();
        assert_eq!(removed.id, backpack);
        assert!(!registry.contains(pouch));
        assert!(!registry.contains(amulet));
        assert_eq!(registry.world(), &[sword]);
        assert_eq!(registry.len(), 1);
        registry.assert_consistent();
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let mut registry = Registry::new();
        let sword = item(&mut registry, "sword", Point::default());
        let copy = Item::from_catalog(sword, "spear", Point::default()).unwrap();
        assert!(!registry.add_item(copy));
        assert_ne!(registry.allocate_id(), sword);
    }
}
