mod chat;
mod core;

pub use self::chat::OpenAiBackend;
pub use self::core::{Message, Role, completion, completion_stream};
