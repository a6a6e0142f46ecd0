pub mod controller;
pub mod store;
pub mod types;

pub use controller::{SessionController, SubmitOutcome, FAREWELL_TEXT};
pub use store::{FileStateStore, MemoryStateStore, SessionCollection, StateStore};
pub use types::{derive_preview, Message, Sender, Session, SessionId};
