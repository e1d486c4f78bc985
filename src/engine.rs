use crate::browser;
use anyhow::{anyhow, Error, Result};
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use serde::{Deserialize, Serialize};
// wasm is single threaded, so Rc<RefCell> rather than Arc<Mutex>
use std::cell::RefCell;
use std::ops::{Add, Sub};
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use self::input::{Input, InputReceiver};

/// Lifecycle every game plugged into the [`GameLoop`] goes through:
/// - `initialize` once, awaiting every asset (failure is fatal)
/// - `update` at a fixed rate, consuming buffered input
/// - `draw` once per animation frame
/// - `shutdown` when the page is being unloaded
#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, input: &mut Input);
    fn draw(&self, renderer: &Renderer);
    fn shutdown(&self) {}
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut receiver: InputReceiver = input::prepare_input()?;
        let game = Rc::new(RefCell::new(game.initialize().await?));
        let mut input = Input::default();
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };

        let exiting = game.clone();
        browser::on_before_unload(move || exiting.borrow().shutdown())?;

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut input, &mut receiver);
            {
                let mut game = game.borrow_mut();
                game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
                while game_loop.accumulated_delta > FRAME_SIZE {
                    game.update(&mut input);
                    game_loop.accumulated_delta -= FRAME_SIZE;
                }
                game_loop.last_frame = perf;
                game.draw(&renderer);
            }
            if let Some(next) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next) {
                    error!("GameLoop: could not schedule next frame: {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn square(side: f32) -> Self {
        Size {
            width: side,
            height: side,
        }
    }
}

/// Axis aligned rectangle, origin top left.
///
/// Two containment tests exist on purpose:
/// - [`Rect::contains`] for pointer hit testing, both edges inclusive
/// - [`Rect::contains_half_open`] for world bounds and tile snapping, so that
///   adjacent cells never both claim the shared edge
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub const fn new_from_x_y(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect::new(Point { x, y }, Size { width, height })
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x() && point.x <= self.right() && point.y >= self.y() && point.y <= self.bottom()
    }

    pub fn contains_half_open(&self, point: Point) -> bool {
        point.x >= self.x() && point.x < self.right() && point.y >= self.y() && point.y < self.bottom()
    }

    pub fn translated(&self, offset: Point) -> Rect {
        Rect::new(self.position + offset, self.size)
    }
}

// ==================== Rendering ====================

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn stroke_rect(&self, rect: &Rect, color: &str) {
        self.context.set_stroke_style_str(color);
        self.context.stroke_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x().into(),
                frame.y().into(),
                frame.size.width.into(),
                frame.size.height.into(),
                destination.x().into(),
                destination.y().into(),
                destination.size.width.into(),
                destination.size.height.into(),
            )
        {
            error!("Renderer: draw_image failed: {:#?}", err);
        }
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let source_name = source.to_string();
    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading {}: {:#?}",
                source_name,
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callbacks alive until the image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // Result<Result<(), Error>, oneshot::Canceled>
    rx.await??;

    Ok(image)
}

// ==================== Input ====================

pub mod input {
    use super::Point;
    use crate::browser;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use std::collections::HashSet;
    use web_sys::{KeyboardEvent, MouseEvent};

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum PointerKind {
        Down,
        Move,
        Up,
        /// right click, used for container navigation
        Secondary,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PointerEvent {
        pub kind: PointerKind,
        pub at: Point,
    }

    pub enum InputEvent {
        KeyDown(String),
        KeyUp(String),
        Pointer(PointerEvent),
    }

    pub type InputReceiver = UnboundedReceiver<InputEvent>;

    /// Keys currently held plus the keys that went down since the last update
    #[derive(Default)]
    pub struct KeyState {
        pressed: HashSet<String>,
        typed: Vec<String>,
    }

    impl KeyState {
        pub fn is_pressed(&self, code: &str) -> bool {
            self.pressed.contains(code)
        }

        /// edge triggered: true once per physical key press
        pub fn was_typed(&self, code: &str) -> bool {
            self.typed.iter().any(|typed| typed == code)
        }

        fn set_pressed(&mut self, code: String) {
            if self.pressed.insert(code.clone()) {
                self.typed.push(code);
            }
        }

        fn set_released(&mut self, code: &str) {
            self.pressed.remove(code);
        }
    }

    #[derive(Default)]
    pub struct Input {
        pub keys: KeyState,
        pointer: Vec<PointerEvent>,
    }

    impl Input {
        /// Hands out buffered pointer events and forgets typed keys. Called by
        /// the game at most once per fixed update so no event is seen twice.
        pub fn drain(&mut self) -> Vec<PointerEvent> {
            self.keys.typed.clear();
            std::mem::take(&mut self.pointer)
        }
    }

    pub fn prepare_input() -> Result<InputReceiver> {
        let (sender, receiver) = unbounded();
        let window = browser::window()?;
        let canvas = browser::canvas()?;

        let keydown_sender = sender.clone();
        let on_keydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            send(&keydown_sender, InputEvent::KeyDown(event.code()));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let keyup_sender = sender.clone();
        let on_keyup = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            send(&keyup_sender, InputEvent::KeyUp(event.code()));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let down_sender = sender.clone();
        let on_mousedown = browser::closure_wrap(Box::new(move |event: MouseEvent| {
            if event.button() == 0 {
                send(&down_sender, pointer(PointerKind::Down, &event));
            }
        }) as Box<dyn FnMut(MouseEvent)>);

        let move_sender = sender.clone();
        let on_mousemove = browser::closure_wrap(Box::new(move |event: MouseEvent| {
            send(&move_sender, pointer(PointerKind::Move, &event));
        }) as Box<dyn FnMut(MouseEvent)>);

        let up_sender = sender.clone();
        let on_mouseup = browser::closure_wrap(Box::new(move |event: MouseEvent| {
            if event.button() == 0 {
                send(&up_sender, pointer(PointerKind::Up, &event));
            }
        }) as Box<dyn FnMut(MouseEvent)>);

        let on_contextmenu = browser::closure_wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            send(&sender, pointer(PointerKind::Secondary, &event));
        }) as Box<dyn FnMut(MouseEvent)>);

        use wasm_bindgen::JsCast;
        window.set_onkeydown(Some(on_keydown.as_ref().unchecked_ref()));
        window.set_onkeyup(Some(on_keyup.as_ref().unchecked_ref()));
        canvas.set_onmousedown(Some(on_mousedown.as_ref().unchecked_ref()));
        canvas.set_onmousemove(Some(on_mousemove.as_ref().unchecked_ref()));
        canvas.set_onmouseup(Some(on_mouseup.as_ref().unchecked_ref()));
        canvas.set_oncontextmenu(Some(on_contextmenu.as_ref().unchecked_ref()));

        // listeners live for the whole page
        on_keydown.forget();
        on_keyup.forget();
        on_mousedown.forget();
        on_mousemove.forget();
        on_mouseup.forget();
        on_contextmenu.forget();

        Ok(receiver)
    }

    pub fn process_input(input: &mut Input, receiver: &mut InputReceiver) {
        loop {
            match receiver.try_next() {
                Ok(None) => break,
                Err(_) => break,
                Ok(Some(InputEvent::KeyDown(code))) => input.keys.set_pressed(code),
                Ok(Some(InputEvent::KeyUp(code))) => input.keys.set_released(&code),
                Ok(Some(InputEvent::Pointer(event))) => input.pointer.push(event),
            }
        }
    }

    fn pointer(kind: PointerKind, event: &MouseEvent) -> InputEvent {
        InputEvent::Pointer(PointerEvent {
            kind,
            at: Point::new(event.offset_x() as f32, event.offset_y() as f32),
        })
    }

    fn send(sender: &UnboundedSender<InputEvent>, event: InputEvent) {
        // a closed channel means the loop is gone, nothing left to notify
        let _ = sender.unbounded_send(event);
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn held_key_is_typed_once() {
            let (sender, mut receiver) = unbounded();
            let mut input = Input::default();
            for _ in 0..3 {
                send(&sender, InputEvent::KeyDown("KeyI".to_string()));
            }
            process_input(&mut input, &mut receiver);
            assert!(input.keys.is_pressed("KeyI"));
            assert!(input.keys.was_typed("KeyI"));

            input.drain();
            assert!(!input.keys.was_typed("KeyI"));
            assert!(input.keys.is_pressed("KeyI"));

            send(&sender, InputEvent::KeyUp("KeyI".to_string()));
            process_input(&mut input, &mut receiver);
            assert!(!input.keys.is_pressed("KeyI"));
        }

        #[test]
        fn pointer_events_are_drained_in_order() {
            let (sender, mut receiver) = unbounded();
            let mut input = Input::default();
            let down = PointerEvent {
                kind: PointerKind::Down,
                at: Point::new(1.0, 2.0),
            };
            let up = PointerEvent {
                kind: PointerKind::Up,
                at: Point::new(3.0, 4.0),
            };
            send(&sender, InputEvent::Pointer(down));
            send(&sender, InputEvent::Pointer(up));
            process_input(&mut input, &mut receiver);
            assert_eq!(input.drain(), vec![down, up]);
            assert!(input.drain().is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_hit_test_includes_both_edges() {
        let rect = Rect::new_from_x_y(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(30.0, 30.0)));
        assert!(!rect.contains(Point::new(30.5, 20.0)));
    }

    #[test]
    fn world_bounds_exclude_max_edge() {
        let rect = Rect::new_from_x_y(0.0, 0.0, 64.0, 64.0);
        assert!(rect.contains_half_open(Point::new(0.0, 0.0)));
        assert!(rect.contains_half_open(Point::new(63.9, 63.9)));
        assert!(!rect.contains_half_open(Point::new(64.0, 10.0)));
        assert!(!rect.contains_half_open(Point::new(10.0, 64.0)));
    }
}
