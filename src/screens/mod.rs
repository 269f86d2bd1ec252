pub mod flow;
pub mod input;
pub mod listing;
pub mod render;
