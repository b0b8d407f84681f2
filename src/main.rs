mod arena;
mod game;
mod term;
mod snake;

use anyhow::Result;
use log::{error, info};

use crate::term::TermManager;

pub type TermInt = u16;
/// (row, col) on a drawing surface. Signed so a step past the border is
/// still representable.
pub type Coords = (i16, i16);

fn main() -> Result<()> {
    pretty_env_logger::init();

    let mut term = TermManager::new()?;
    if let Err(e) = term.setup() {
        // Nothing has been drawn yet; put the terminal back and bail
        let _ = term.restore();
        return Err(e);
    }

    let result = game::SnakeGame::new(&mut term).run();

    // Always try to restore, even if the game loop failed
    let restored = term.restore();
    match &result {
        Ok(()) => info!("exited normally"),
        Err(e) => error!("game loop failed: {:#}", e),
    }

    result.and(restored)
}
