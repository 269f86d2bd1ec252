pub mod controller;
pub mod history;
pub mod store;

pub use controller::SessionController;
pub use store::SessionStore;
