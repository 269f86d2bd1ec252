pub mod session;

pub use session::{
    session_id_at, InvalidSettings, Session, SessionSettings, SessionStatus, SessionUpdate,
};
