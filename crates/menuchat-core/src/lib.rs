pub mod ai;
pub mod config;
pub mod error;
pub mod model;
pub mod persona;
pub mod prompt;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use ai::{CompletionClient, CompletionRequest, HttpReply, HttpTransport, ReqwestTransport};
pub use config::{JsonFileStore, MemoryStore, PreferenceStore, Preferences};
pub use error::{CompletionError, SessionError, TransportError};
pub use model::ChatModel;
pub use persona::Persona;
pub use prompt::{build_prompt, can_send, PromptInputs, PromptMode};
pub use session::{CompletionResult, CompletionSession};
pub use state::CopyFeedback;
