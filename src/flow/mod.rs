pub mod clock;
pub mod driver;
pub mod engine;
pub mod state;

pub use clock::SystemClock;
pub use driver::{FlowChannels, FlowDriver};
pub use engine::PhaseEngine;
pub use state::Frame;
