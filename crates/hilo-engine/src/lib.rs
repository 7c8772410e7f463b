//! # hilo-engine
//!
//! **Coordinator**: owns the table state and applies typed commands one at a
//! time.
//!
//! ## Layers
//!
//! ```text
//! chat text ──decode_text──► Command ──EngineHandle (mpsc)──► Engine::execute
//!                                                                │
//!                       BetIntake / SettlementEngine / RollbackManager
//!                                                                │
//!                                     CreditConservation::verify + StateStore::save
//! ```
//!
//! A failed command leaves the state exactly as it was; a successful one is
//! persisted before its result is returned.

pub mod actor;
pub mod command;
pub mod decode;
pub mod engine;
pub mod state;
pub mod store;

pub use actor::{DEFAULT_MAILBOX_CAPACITY, EngineHandle};
pub use command::{Command, CommandOutput};
pub use decode::{Role, decode_text};
pub use engine::Engine;
pub use state::EngineState;
pub use store::{JsonFileStore, MemoryStore, StateStore};
