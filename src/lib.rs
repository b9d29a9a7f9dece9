// Public modules
pub mod chat;
pub mod client;
pub mod decoder;
pub mod error;
pub mod markdown;
pub mod message;
pub mod render;
pub mod store;

mod observability;

// Re-exports
pub use client::{AnswerClient, AnswerService, ByteStream, QuestionRequest};
pub use decoder::{Utf8StreamDecoder, decode_stream};
pub use error::{Error, Result};
pub use message::{IdGenerator, Message, MessageId, Role};
pub use observability::register_biometrics;
pub use render::{Renderer, TerminalRenderer};
pub use store::MessageStore;
