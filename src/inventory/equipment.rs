use super::item::{Category, ItemId};
use super::registry::{Pool, Registry};
use super::Revert;
use crate::config::rules;
use crate::engine::Point;

/// One slot per [`Category`], indexed by `Category::index`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EquipmentSlots {
    slots: [Option<ItemId>; 8],
}

impl EquipmentSlots {
    pub fn get(&self, slot: Category) -> Option<ItemId> {
        self.slots[slot.index()]
    }

    pub(super) fn set(&mut self, slot: Category, occupant: Option<ItemId>) {
        self.slots[slot.index()] = occupant;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Option<ItemId>)> + '_ {
        Category::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    pub fn occupants(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.slots.iter().flatten().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub equipped: ItemId,
    /// previous occupant, now lying in the world
    pub evicted: Option<ItemId>,
}

/// Wears `id` in `slot`, drawn at `anchor`.
///
/// A previous occupant is swapped out to the world at `former`, the spot the
/// new item came from, at full scale.
pub fn equip(registry: &mut Registry, id: ItemId, slot: Category, anchor: Point, former: Point) -> Result<Swap, Revert> {
    let item = registry.get(id).ok_or(Revert::Unknown)?;
    if item.category != slot {
        return Err(Revert::CategoryMismatch);
    }
    let from = registry.owner(id).ok_or(Revert::Unknown)?;
    if from == Pool::Equipped(slot) {
        return Err(Revert::AlreadyThere);
    }

    let evicted = registry.slots().get(slot);
    if let Some(previous) = evicted {
        registry.move_item(previous, Pool::Equipped(slot), Pool::World);
        registry.settle(previous, former, rules::WORLD_SCALE);
    }

    if !registry.move_item(id, from, Pool::Equipped(slot)) {
        // put the previous occupant back so nothing changed
        if let Some(previous) = evicted {
            registry.move_item(previous, Pool::World, Pool::Equipped(slot));
            registry.settle(previous, anchor, rules::PANEL_SCALE);
        }
        return Err(Revert::Unknown);
    }
    registry.settle(id, anchor, rules::PANEL_SCALE);

    Ok(Swap {
        equipped: id,
        evicted,
    })
}

/// Takes off whatever `slot` holds and lays it in the world at `at`
pub fn unequip(registry: &mut Registry, slot: Category, at: Point) -> Result<ItemId, Revert> {
    let id = registry.slots().get(slot).ok_or(Revert::EmptySlot)?;
    if !registry.move_item(id, Pool::Equipped(slot), Pool::World) {
        return Err(Revert::Unknown);
    }
    registry.settle(id, at, rules::WORLD_SCALE);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::item::Item;
    use approx::assert_relative_eq;

    const MAINHAND_ANCHOR: Point = Point::new(848.0, 80.0);

    fn world_item(registry: &mut Registry, name: &str, position: Point) -> ItemId {
        let id = registry.allocate_id();
        assert!(registry.add_item(Item::from_catalog(id, name, position).unwrap()));
        id
    }

    #[test]
    fn equip_into_empty_slot() {
        let mut registry = Registry::new();
        let sword_at = Point::new(640.0, 512.0);
        let sword = world_item(&mut registry, "sword", sword_at);

        let swap = equip(&mut registry, sword, Category::Mainhand, MAINHAND_ANCHOR, sword_at).unwrap();
        assert_eq!(swap.evicted, None);
        assert_eq!(registry.slots().get(Category::Mainhand), Some(sword));

        let item = registry.get(sword).unwrap();
        assert_relative_eq!(item.sprite.scale, 0.5);
        assert_eq!(item.position(), MAINHAND_ANCHOR);
        assert!(!item.is_dragging);
        assert!(registry.world().is_empty());
        registry.assert_consistent();
    }

    #[test]
    fn equip_into_occupied_slot_swaps() {
        let mut registry = Registry::new();
        let sword = world_item(&mut registry, "sword", Point::new(640.0, 512.0));
        equip(&mut registry, sword, Category::Mainhand, MAINHAND_ANCHOR, Point::new(640.0, 512.0)).unwrap();

        let spear_at = Point::new(576.0, 512.0);
        let spear = world_item(&mut registry, "spear", spear_at);
        let swap = equip(&mut registry, spear, Category::Mainhand, MAINHAND_ANCHOR, spear_at).unwrap();

        assert_eq!(swap.evicted, Some(sword));
        assert_eq!(registry.slots().get(Category::Mainhand), Some(spear));
        assert_eq!(registry.owner(sword), Some(Pool::World));
        let sword = registry.get(sword).unwrap();
        assert_eq!(sword.position(), spear_at);
        assert_relative_eq!(sword.sprite.scale, 1.0);
        registry.assert_consistent();
    }

    #[test]
    fn mismatched_category_is_ignored() {
        let mut registry = Registry::new();
        let helmet = world_item(&mut registry, "helmet", Point::default());
        assert_eq!(
            equip(&mut registry, helmet, Category::Feet, MAINHAND_ANCHOR, Point::default()),
            Err(Revert::CategoryMismatch)
        );
        assert_eq!(registry.owner(helmet), Some(Pool::World));
        assert_eq!(registry.slots().occupants().count(), 0);
    }

    #[test]
    fn re_equipping_the_occupant_is_ignored() {
        let mut registry = Registry::new();
        let sword = world_item(&mut registry, "sword", Point::default());
        equip(&mut registry, sword, Category::Mainhand, MAINHAND_ANCHOR, Point::default()).unwrap();
        assert_eq!(
            equip(&mut registry, sword, Category::Mainhand, MAINHAND_ANCHOR, Point::default()),
            Err(Revert::AlreadyThere)
        );
        assert_eq!(registry.slots().get(Category::Mainhand), Some(sword));
    }

    #[test]
    fn unequip_drops_into_the_world() {
        let mut registry = Registry::new();
        let boots = world_item(&mut registry, "boots", Point::default());
        equip(&mut registry, boots, Category::Feet, MAINHAND_ANCHOR, Point::default()).unwrap();

        let at = Point::new(128.0, 192.0);
        assert_eq!(unequip(&mut registry, Category::Feet, at), Ok(boots));
        assert_eq!(registry.slots().get(Category::Feet), None);
        let boots = registry.get(boots).unwrap();
        assert_eq!(boots.position(), at);
        assert_relative_eq!(boots.sprite.scale, 1.0);
        registry.assert_consistent();

        assert_eq!(unequip(&mut registry, Category::Feet, at), Err(Revert::EmptySlot));
    }

    #[test]
    fn slot_iteration_covers_every_category() {
        let slots = EquipmentSlots::default();
        let listed: Vec<Category> = slots.iter().map(|(slot, _)| slot).collect();
        assert_eq!(listed, Category::ALL.to_vec());
    }
}
