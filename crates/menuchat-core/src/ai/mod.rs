pub mod openai;
pub mod transport;

pub use openai::{CompletionClient, CompletionRequest};
pub use transport::{HttpReply, HttpTransport, ReqwestTransport};
