use crate::browser;
use crate::config::{assets, canvas, grid, rules, tiles};
use crate::engine::input::{Input, PointerKind};
use crate::engine::{self, Game, Point, Rect, Renderer, Size};
use crate::inventory::container::Level;
use crate::inventory::drag::{DragController, DropOutcome, Scene};
use crate::inventory::item::{Item, ItemId};
use crate::inventory::placement::Layout;
use crate::inventory::{Inventory, Navigation};
use crate::player::{Facing, Player};
use crate::save::{self, PlayerState, SaveFile};
use crate::world::TileMap;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::join;
use web_sys::HtmlImageElement;

/// ┌──────────────────────── Frame Overview ─────────────────────────────┐
/// │                                                                     │
/// │   engine.rs GameLoop ──update──▶ Rpg::update ──▶ Session::update    │
/// │                      ──draw────▶ Rpg::draw   ──▶ Session::draw      │
/// │                                                                     │
/// │   Session::update                                                   │
/// │     ├─► KeyI          toggles inventory mode                        │
/// │     ├─► Arrow keys    move the avatar (not while dragging)          │
/// │     ├─► left button   DragController: down / move / up              │
/// │     └─► right button  Inventory::navigate (open / close containers) │
/// │                                                                     │
/// │   Session::draw  (back to front)                                    │
/// │     map ─► world items ─► avatar ─► sidebar ─► dragged item         │
/// └─────────────────────────────────────────────────────────────────────┘
pub enum Rpg {
    /// assets and player data are still on their way
    Loading,
    Loaded(Session),
}

const DEFAULT_NAME: &str = "player";
const NAME_INPUT_ID: &str = "playername";
const LOGIN_FORM_ID: &str = "login-form";

mod colors {
    pub const BACKGROUND: &str = "#464646";
    pub const EQUIPMENT_PANEL: &str = "#2b2b2b";
    pub const INVENTORY_PANEL: &str = "#333333";
    pub const SLOT: &str = "#8a8a8a";
    pub const PRIMARY_GRID: &str = "#b0a070";
    pub const SECONDARY_GRID: &str = "#70a0b0";
    pub const INVENTORY_MODE: &str = "#e0c050";
}

impl Rpg {
    pub fn new() -> Self {
        Rpg::Loading
    }

    async fn load_map() -> Result<TileMap> {
        browser::fetch_json::<TileMap>(assets::MAP_DATA)
            .await
            .with_context(|| format!("Failed to load map from : {}", assets::MAP_DATA))?
            .validated()
    }

    async fn load_sheet(path: &str) -> Result<HtmlImageElement> {
        engine::load_image(path)
            .await
            .with_context(|| format!("Failed to load sprite sheet from : {}", path))
    }
}

impl Default for Rpg {
    fn default() -> Self {
        Rpg::new()
    }
}

#[async_trait(?Send)]
impl Game for Rpg {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            Rpg::Loading => {
                browser::resize_canvas(canvas::WIDTH as u32, canvas::HEIGHT as u32)?;
                // the name is only read once the player has submitted it
                let (map, map_sheet, player_sheet, item_sheet, file, login) = join!(
                    Self::load_map(),
                    Self::load_sheet(assets::MAP_SHEET),
                    Self::load_sheet(assets::PLAYER_SHEET),
                    Self::load_sheet(assets::ITEM_SHEET),
                    save::load(),
                    browser::form_submitted(LOGIN_FORM_ID),
                );
                login?;
                // without a save file everybody starts fresh
                let file = file.unwrap_or_else(|err| {
                    error!("{:#}, starting without saved players", err);
                    SaveFile::default()
                });
                let sheets = Sheets {
                    map: map_sheet?,
                    player: player_sheet?,
                    items: item_sheet?,
                };
                Ok(Box::new(Rpg::Loaded(Session::new(map?, sheets, file))))
            }
            Rpg::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, input: &mut Input) {
        if let Rpg::Loaded(session) = self {
            session.update(input);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let Rpg::Loaded(session) = self {
            session.draw(renderer);
        }
    }

    fn shutdown(&self) {
        if let Rpg::Loaded(session) = self {
            save::save_in_background(session.snapshot());
        }
    }
}

struct Sheets {
    map: HtmlImageElement,
    player: HtmlImageElement,
    items: HtmlImageElement,
}

pub struct Session {
    map: TileMap,
    sheets: Sheets,
    player: Player,
    player_id: u32,
    inventory: Inventory,
    drag: DragController,
    inventory_mode: bool,
    /// everybody else in `player.json`, written back on save
    file: SaveFile,
}

impl Session {
    fn new(map: TileMap, sheets: Sheets, file: SaveFile) -> Self {
        let name = browser::input_value(NAME_INPUT_ID).unwrap_or_else(|| DEFAULT_NAME.to_string());
        let layout = Layout::default();

        let (state, inventory) = match file.find(&name) {
            Some(state) if !state.is_fresh() => {
                log!("welcome back {}", name);
                (state.clone(), state.restore(layout))
            }
            Some(state) => (state.clone(), Inventory::seeded(layout)),
            None => {
                log!("creating player {}", name);
                (PlayerState::new(file.next_id(), &name), Inventory::seeded(layout))
            }
        };
        log!("{} items loaded", inventory.registry().len());

        Session {
            map,
            sheets,
            player: Player::new(&state.name, state.position),
            player_id: state.id,
            inventory,
            drag: DragController::new(),
            inventory_mode: false,
            file,
        }
    }

    fn snapshot(&self) -> SaveFile {
        let mut file = self.file.clone();
        file.upsert(PlayerState::capture(
            self.player_id,
            &self.player,
            &self.inventory,
            self.drag.held(),
        ));
        file
    }

    fn update(&mut self, input: &mut Input) {
        if input.keys.was_typed("KeyI") {
            self.inventory_mode = !self.inventory_mode;
            log!("inventory mode {}", if self.inventory_mode { "on" } else { "off" });
        }

        // the camera follows the avatar, so hold still while carrying
        if self.drag.dragged().is_none() {
            for code in ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"] {
                if input.keys.is_pressed(code) {
                    if let Some(facing) = Facing::from_key(code) {
                        self.player.step(facing, &self.map);
                    }
                }
            }
        }
        self.player.update();

        let scene = Scene {
            tiles: &self.map,
            player: self.player.cell(),
            inventory_mode: self.inventory_mode,
        };
        for event in input.drain() {
            match event.kind {
                PointerKind::Down => {
                    self.drag.pointer_down(&mut self.inventory, &scene, event.at);
                }
                PointerKind::Move => self.drag.pointer_move(&mut self.inventory, event.at),
                PointerKind::Up => {
                    if let Some(outcome) = self.drag.pointer_up(&mut self.inventory, &scene, event.at) {
                        log_outcome(&outcome);
                    }
                }
                PointerKind::Secondary => {
                    if self.inventory_mode && self.drag.dragged().is_none() {
                        match self.inventory.navigate(event.at) {
                            Navigation::Opened(id) => log!("opened container {}", id),
                            Navigation::Closed => log!("closed container"),
                            Navigation::Ignored => {}
                        }
                    }
                }
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let layout = self.inventory.layout();
        let registry = self.inventory.registry();
        let camera = layout.camera(self.player.cell());
        let world_offset = Point::new(-camera.x, -camera.y);

        renderer.clear(&Rect::new_from_x_y(0.0, 0.0, canvas::WIDTH, canvas::HEIGHT));
        renderer.fill_rect(&layout.world, colors::BACKGROUND);
        self.map.draw(renderer, &self.sheets.map, camera);

        // world pool in z-order, the dragged one comes last
        for item in registry.world().iter().filter_map(|id| registry.get(*id)) {
            if !item.is_dragging {
                item.draw(renderer, &self.sheets.items, world_offset);
            }
        }
        self.player.draw(renderer, &self.sheets.player);

        self.draw_equipment(renderer);
        self.draw_grid(renderer);

        if let Some(item) = self.drag.dragged().and_then(|id| registry.get(id)) {
            item.draw(renderer, &self.sheets.items, Point::default());
        }
    }

    fn draw_equipment(&self, renderer: &Renderer) {
        let layout = self.inventory.layout();
        renderer.fill_rect(&layout.equipment, colors::EQUIPMENT_PANEL);
        if self.inventory_mode {
            renderer.stroke_rect(&layout.equipment, colors::INVENTORY_MODE);
        }
        for (slot, occupant) in self.inventory.registry().slots().iter() {
            renderer.stroke_rect(&slot_frame(layout.slot_anchor(slot)), colors::SLOT);
            if let Some(item) = occupant.and_then(|id| self.visible(id)) {
                item.draw(renderer, &self.sheets.items, Point::default());
            }
        }
    }

    fn draw_grid(&self, renderer: &Renderer) {
        let layout = self.inventory.layout();
        renderer.fill_rect(&layout.inventory, colors::INVENTORY_PANEL);
        let view = self.inventory.view();
        let Some(level) = view.active_level() else {
            return;
        };
        let color = match level {
            Level::Primary => colors::PRIMARY_GRID,
            Level::Secondary => colors::SECONDARY_GRID,
        };
        for index in 0..grid::CAPACITY {
            renderer.stroke_rect(&slot_frame(layout.grid_cell(index)), color);
        }
        for item in self.inventory.displayed().iter().filter_map(|id| self.visible(*id)) {
            item.draw(renderer, &self.sheets.items, Point::default());
        }
    }

    /// the item, unless it is under the pointer and drawn separately
    fn visible(&self, id: ItemId) -> Option<&Item> {
        self.inventory.registry().get(id).filter(|item| !item.is_dragging)
    }
}

/// Outline of an equipment or grid cell around an anchor
fn slot_frame(anchor: Point) -> Rect {
    let side = tiles::SIZE * rules::PANEL_SCALE;
    Rect::new(anchor, Size::square(side))
}

fn log_outcome(outcome: &DropOutcome) {
    match outcome {
        DropOutcome::Placed { item, cell } => log!("placed {} at {:?}", item, cell),
        DropOutcome::Equipped { item, evicted } => match evicted {
            Some(evicted) => log!("equipped {}, {} dropped", item, evicted),
            None => log!("equipped {}", item),
        },
        DropOutcome::Contained { item, container } => log!("stowed {} in {}", item, container),
        DropOutcome::Destroyed { item } => log!("{} sank in the water", item),
        DropOutcome::Reverted { item, reason } => log!("{} stays put : {:?}", item, reason),
    }
}
