use crate::config::{rules, tiles};
use crate::engine::{Point, Rect, Renderer};
use crate::world::{Cell, TileKind, TileSource};
use web_sys::HtmlImageElement;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    #[default]
    Down,
    Up,
    Right,
    Left,
}

impl Facing {
    pub fn from_key(code: &str) -> Option<Facing> {
        match code {
            "ArrowDown" => Some(Facing::Down),
            "ArrowUp" => Some(Facing::Up),
            "ArrowRight" => Some(Facing::Right),
            "ArrowLeft" => Some(Facing::Left),
            _ => None,
        }
    }

    /// (columns, rows) moved by one step
    fn delta(self) -> (i32, i32) {
        match self {
            Facing::Down => (0, 1),
            Facing::Up => (0, -1),
            Facing::Right => (1, 0),
            Facing::Left => (-1, 0),
        }
    }

    /// top left of the frame in the player sheet
    fn frame(self) -> Point {
        match self {
            Facing::Down => Point::new(0.0, 0.0),
            Facing::Up => Point::new(0.0, 64.0),
            Facing::Right => Point::new(64.0, 0.0),
            Facing::Left => Point::new(64.0, 64.0),
        }
    }
}

pub enum Event<'a> {
    Step(Facing, &'a dyn TileSource),
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlayerContext {
    cell: Cell,
    facing: Facing,
    cooldown: u8,
}

impl PlayerContext {
    fn face(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    fn advance(mut self) -> Self {
        let (columns, rows) = self.facing.delta();
        self.cell = self.cell.offset(columns, rows);
        self.cooldown = rules::MOVE_COOLDOWN;
        self
    }

    fn cool_down(mut self) -> Self {
        self.cooldown = self.cooldown.saturating_sub(1);
        self
    }
}

/// ┌──────────── Avatar Movement ─────────────────────┐
/// │  Ready   ── Step onto floor ──▶ Cooling          │
/// │  Ready   ── Step into wall  ──▶ Ready (turned)   │
/// │  Cooling ── Update ×N       ──▶ Ready            │
/// │  Cooling ── Step            ──▶ Cooling          │
/// └──────────────────────────────────────────────────┘
#[derive(Debug, Clone, Copy, PartialEq)]
enum PlayerStateMachine {
    Ready(PlayerContext),
    Cooling(PlayerContext),
}

impl PlayerStateMachine {
    fn transition(self, event: Event) -> Self {
        use PlayerStateMachine::*;
        match (self, event) {
            (Ready(context), Event::Step(facing, tiles)) => {
                let context = context.face(facing);
                let (columns, rows) = facing.delta();
                match tiles.tile_kind(context.cell.offset(columns, rows)) {
                    TileKind::Floor => Cooling(context.advance()),
                    TileKind::Boundary | TileKind::Water => Ready(context),
                }
            }
            (Cooling(context), Event::Update) => {
                let context = context.cool_down();
                if context.cooldown == 0 {
                    Ready(context)
                } else {
                    Cooling(context)
                }
            }
            _ => self,
        }
    }

    fn context(&self) -> &PlayerContext {
        match self {
            PlayerStateMachine::Ready(context) | PlayerStateMachine::Cooling(context) => context,
        }
    }
}

pub struct Player {
    name: String,
    state: PlayerStateMachine,
}

impl Player {
    pub fn new(name: &str, cell: Cell) -> Self {
        Player {
            name: name.to_string(),
            state: PlayerStateMachine::Ready(PlayerContext {
                cell,
                facing: Facing::default(),
                cooldown: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self) -> Cell {
        self.state.context().cell
    }

    pub fn facing(&self) -> Facing {
        self.state.context().facing
    }

    /// Tries one tile towards `facing`; water and walls only turn the avatar.
    /// Returns whether it moved.
    pub fn step(&mut self, facing: Facing, tiles: &dyn TileSource) -> bool {
        let before = self.cell();
        self.state = self.state.transition(Event::Step(facing, tiles));
        self.cell() != before
    }

    pub fn update(&mut self) {
        self.state = self.state.transition(Event::Update);
    }

    /// The avatar stays on its screen cell, the map scrolls beneath it
    pub fn draw(&self, renderer: &Renderer, sheet: &HtmlImageElement) {
        let frame = self.facing().frame();
        let (column, row) = tiles::PLAYER_SCREEN_CELL;
        renderer.draw_image(
            sheet,
            &Rect::new_from_x_y(frame.x, frame.y, tiles::SIZE, tiles::SIZE),
            &Rect::new_from_x_y(
                column as f32 * tiles::SIZE,
                row as f32 * tiles::SIZE,
                tiles::SIZE,
                tiles::SIZE,
            ),
        );
    }
}
