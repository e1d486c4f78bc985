use super::item::ItemId;

/// ┌──────────────── Container Navigation ─────────────────────────┐
/// │  From          →  Event             →  To                     │
/// ├───────────────────────────────────────────────────────────────┤
/// │  Closed        →  Open(a)           →  PrimaryOpen(a)         │
/// │  PrimaryOpen(a)→  Open(b), b != a   →  BothOpen(a, b)         │
/// │  BothOpen(a,b) →  CloseTop          →  PrimaryOpen(a)         │
/// │  PrimaryOpen(a)→  CloseTop          →  Closed                 │
/// │  any           →  Release(x)        →  CloseTop until no      │
/// │                                        level shows x          │
/// │  -------          ------                                      │
/// │  Open on the open top, Open while BothOpen, CloseTop while    │
/// │  Closed: no change                                            │
/// └───────────────────────────────────────────────────────────────┘
///
/// The two levels are the primary and secondary stacks. Encoding them as one
/// enum keeps "secondary without primary" and a third level unrepresentable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ContainerView {
    #[default]
    Closed,
    PrimaryOpen {
        primary: ItemId,
    },
    BothOpen {
        primary: ItemId,
        secondary: ItemId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEvent {
    Open(ItemId),
    CloseTop,
    /// a new back item replaced `previous` (if any) in the back slot
    EquipBack { previous: Option<ItemId> },
    UnequipBack(ItemId),
    /// the item left the pool it was shown from
    Release(ItemId),
}

impl ContainerView {
    pub fn transition(self, event: ContainerEvent) -> Self {
        use ContainerView::*;
        match (self, event) {
            (Closed, ContainerEvent::Open(primary)) => PrimaryOpen { primary },
            (PrimaryOpen { primary }, ContainerEvent::Open(secondary)) if secondary != primary => {
                BothOpen { primary, secondary }
            }
            (BothOpen { primary, .. }, ContainerEvent::CloseTop) => PrimaryOpen { primary },
            (PrimaryOpen { .. }, ContainerEvent::CloseTop) => Closed,
            (_, ContainerEvent::EquipBack { previous: Some(item) }) => self.collapse(item),
            (_, ContainerEvent::UnequipBack(item)) => self.collapse(item),
            (_, ContainerEvent::Release(item)) => self.collapse(item),
            _ => self,
        }
    }

    fn collapse(self, item: ItemId) -> Self {
        let mut view = self;
        while view.shows(item) {
            view = view.transition(ContainerEvent::CloseTop);
        }
        view
    }

    /// true if any level is anchored to `item`
    pub fn shows(&self, item: ItemId) -> bool {
        self.primary() == Some(item) || self.secondary() == Some(item)
    }

    pub fn primary(&self) -> Option<ItemId> {
        match *self {
            ContainerView::Closed => None,
            ContainerView::PrimaryOpen { primary } | ContainerView::BothOpen { primary, .. } => Some(primary),
        }
    }

    pub fn secondary(&self) -> Option<ItemId> {
        match *self {
            ContainerView::BothOpen { secondary, .. } => Some(secondary),
            _ => None,
        }
    }

    /// Container whose contents the grid displays: the deepest open level
    pub fn active(&self) -> Option<ItemId> {
        self.secondary().or(self.primary())
    }

    pub fn active_level(&self) -> Option<Level> {
        match self {
            ContainerView::Closed => None,
            ContainerView::PrimaryOpen { .. } => Some(Level::Primary),
            ContainerView::BothOpen { .. } => Some(Level::Secondary),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            ContainerView::Closed => 0,
            ContainerView::PrimaryOpen { .. } => 1,
            ContainerView::BothOpen { .. } => 2,
        }
    }
}
