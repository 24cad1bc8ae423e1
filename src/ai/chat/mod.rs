//! Conversation sessions and the rules for turning a user's message
//! and the current settings into a request for the model.
pub mod compose;
pub mod core;
pub mod models;
pub mod session;

pub use compose::{
    GenerationConfig, GenerationConfigError, LengthPreference, OutboundRequest, compose,
    length_instruction,
};
pub use self::core::{Delivery, GenerationBackend, IncrementStream, next_reply, next_turn};
pub use models::{ChatMessage, Role, SessionStore};
pub use session::{Session, SessionError, SessionRegistry, SessionSummary, TurnTicket};
