// ==================== Imports ====================
use wasm_bindgen::prelude::*;

// macros first, every module below logs through them
#[macro_use]
pub mod browser;
pub mod config;
pub mod engine;
mod game;
pub mod inventory;
pub mod player;
pub mod save;
pub mod world;

use engine::GameLoop;
use game::Rpg;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - loads map, sprite sheets and player data
/// - hands the game to the loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(Rpg::new()).await {
            error!("Could not start game : {:#?}", err);
        }
    });

    Ok(())
}
