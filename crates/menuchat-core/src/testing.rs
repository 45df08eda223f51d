//! In-memory transport used by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::ai::openai::ChatCompletionRequest;
use crate::ai::transport::{HttpReply, HttpTransport};
use crate::error::TransportError;

enum Canned {
    Reply(HttpReply),
    Fail(String),
}

pub struct MockTransport {
    canned: Canned,
    calls: AtomicUsize,
    last: Mutex<Option<(String, String, ChatCompletionRequest)>>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    pub fn with_reply(reply: HttpReply) -> Self {
        Self {
            canned: Canned::Reply(reply),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            gate: None,
        }
    }

    pub fn replying(status: u16, body: &str) -> Self {
        Self::with_reply(HttpReply::new(status, body.as_bytes().to_vec()))
    }

    pub fn failing(message: &str) -> Self {
        Self {
            canned: Canned::Fail(message.to_string()),
            ..Self::replying(200, "")
        }
    }

    /// Hold every reply until the returned handle is notified
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(String, String, ChatCompletionRequest)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_chat(
        &self,
        url: &str,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<HttpReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((url.to_string(), api_key.to_string(), request.clone()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.canned {
            Canned::Reply(reply) => Ok(reply.clone()),
            Canned::Fail(message) => Err(TransportError::new(message.clone())),
        }
    }
}
