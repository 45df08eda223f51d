//! Single-flight request slot shared by the front-ends
//!
//! The front-end submits one request, keeps drawing, and collects the result
//! later from its own event loop. While a result is outstanding (in flight, or
//! finished but not yet taken) further submissions are refused.

use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::debug;

use crate::ai::openai::{CompletionClient, CompletionRequest};
use crate::error::{CompletionError, SessionError, TransportError};

pub type CompletionResult = Result<String, CompletionError>;

#[derive(Default)]
pub struct CompletionSession {
    pending: Option<oneshot::Receiver<CompletionResult>>,
}

impl CompletionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start `request` on the tokio runtime. Must be called from within a runtime.
    pub fn submit(
        &mut self,
        client: &CompletionClient,
        request: CompletionRequest,
    ) -> Result<(), SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::AlreadyPending);
        }

        let (tx, rx) = oneshot::channel();
        let client = client.clone();
        debug!(model = %request.model, "submitting completion request");
        tokio::spawn(async move {
            let result = client.send(&request).await;
            // Receiver gone means the front-end shut down; nothing to deliver.
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
        Ok(())
    }

    /// Non-blocking. Yields the finished result exactly once.
    pub fn try_take(&mut self) -> Option<CompletionResult> {
        let rx = self.pending.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(abandoned()),
        };
        self.pending = None;
        debug!(ok = result.is_ok(), "completion request finished");
        Some(result)
    }

    /// Wait for the outstanding request. `None` when nothing was submitted.
    pub async fn wait(&mut self) -> Option<CompletionResult> {
        let rx = self.pending.take()?;
        let result = rx.await.unwrap_or_else(|_| Err(abandoned()));
        debug!(ok = result.is_ok(), "completion request finished");
        Some(result)
    }
}

fn abandoned() -> CompletionError {
    CompletionError::Transport(TransportError::new(
        "request task ended without a result",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use std::sync::Arc;

    const OK_BODY: &str = r#"{"choices":[{"message":{"content":" answer "}}]}"#;

    fn request() -> CompletionRequest {
        CompletionRequest::new("question", "sk-test", "gpt-5-mini")
    }

    #[tokio::test]
    async fn test_idle_session_has_nothing_to_take() {
        let mut session = CompletionSession::new();
        assert!(!session.is_pending());
        assert!(session.try_take().is_none());
        assert!(session.wait().await.is_none());
    }

    #[tokio::test]
    async fn test_submit_then_wait_delivers_result() {
        let mock = Arc::new(MockTransport::replying(200, OK_BODY));
        let client = CompletionClient::with_transport(mock.clone());
        let mut session = CompletionSession::new();

        session.submit(&client, request()).unwrap();
        assert!(session.is_pending());

        let result = session.wait().await.unwrap();
        assert_eq!(result.unwrap(), "answer");
        assert!(!session.is_pending());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_submit_is_refused_while_pending() {
        let (mock, gate) = MockTransport::replying(200, OK_BODY).gated();
        let mock = Arc::new(mock);
        let client = CompletionClient::with_transport(mock.clone());
        let mut session = CompletionSession::new();

        session.submit(&client, request()).unwrap();
        assert_eq!(
            session.submit(&client, request()),
            Err(SessionError::AlreadyPending)
        );

        tokio::task::yield_now().await;
        assert!(session.try_take().is_none());
        assert!(session.is_pending());

        gate.notify_one();
        let result = session.wait().await.unwrap();
        assert_eq!(result.unwrap(), "answer");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_try_take_returns_result_once() {
        let mock = Arc::new(MockTransport::replying(401, r#"{"error":{"message":"invalid key"}}"#));
        let client = CompletionClient::with_transport(mock);
        let mut session = CompletionSession::new();

        session.submit(&client, request()).unwrap();

        let mut taken = None;
        for _ in 0..100 {
            if let Some(result) = session.try_take() {
                taken = Some(result);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let err = taken.expect("result never arrived").unwrap_err();
        assert_eq!(err.to_string(), "invalid key");
        assert!(session.try_take().is_none());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_through_session() {
        let mock = Arc::new(MockTransport::replying(200, OK_BODY));
        let client = CompletionClient::with_transport(mock.clone());
        let mut session = CompletionSession::new();

        session
            .submit(&client, CompletionRequest::new("question", "", "gpt-5-mini"))
            .unwrap();

        let result = session.wait().await.unwrap();
        assert!(matches!(result, Err(CompletionError::MissingCredential)));
        assert_eq!(mock.calls(), 0);
    }

    struct PanickingTransport;

    #[async_trait::async_trait]
    impl crate::ai::transport::HttpTransport for PanickingTransport {
        async fn post_chat(
            &self,
            _url: &str,
            _api_key: &str,
            _request: &crate::ai::openai::ChatCompletionRequest,
        ) -> Result<crate::ai::transport::HttpReply, TransportError> {
            panic!("transport blew up");
        }
    }

    #[tokio::test]
    async fn test_task_dying_without_result_is_transport_error() {
        let client = CompletionClient::with_transport(Arc::new(PanickingTransport));
        let mut session = CompletionSession::new();

        session.submit(&client, request()).unwrap();
        let result = session.wait().await.unwrap();

        match result {
            Err(CompletionError::Transport(err)) => {
                assert_eq!(err.to_string(), "request task ended without a result")
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_try_take_reports_dead_task() {
        let client = CompletionClient::with_transport(Arc::new(PanickingTransport));
        let mut session = CompletionSession::new();
        session.submit(&client, request()).unwrap();

        let mut taken = None;
        for _ in 0..100 {
            if let Some(result) = session.try_take() {
                taken = Some(result);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert!(matches!(taken, Some(Err(CompletionError::Transport(_)))));
        assert!(!session.is_pending());
    }
}
