mod engine;
mod win;

pub use engine::{GameEngine, OnWin, TickResult};
pub use win::{WinJudge, WinState};
