//! Test-only helpers: an `App` wired to a canned transport and an in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use menuchat_core::ai::openai::ChatCompletionRequest;
use menuchat_core::config::API_KEY_PREF;
use menuchat_core::{
    CompletionClient, HttpReply, HttpTransport, MemoryStore, Persona, PreferenceStore,
    Preferences, TransportError,
};

use crate::app::App;

pub struct CannedTransport {
    status: u16,
    body: &'static str,
    calls: AtomicUsize,
    last: Mutex<Option<(String, ChatCompletionRequest)>>,
}

impl CannedTransport {
    pub fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.last.lock().unwrap().as_ref().map(|(_, request)| request.clone())
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|(key, _)| key.clone())
    }
}

#[async_trait]
impl HttpTransport for CannedTransport {
    async fn post_chat(
        &self,
        _url: &str,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<HttpReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((api_key.to_string(), request.clone()));
        Ok(HttpReply::new(self.status, self.body))
    }
}

pub fn app_with_env(
    transport: Arc<CannedTransport>,
    api_key: &str,
    persona: Persona,
    env_key: Option<&str>,
) -> App {
    let mut store = MemoryStore::new();
    store.set(API_KEY_PREF, api_key).unwrap();
    let prefs: Preferences<Box<dyn PreferenceStore>> = Preferences::new(Box::new(store));
    App::with_env_key(
        prefs,
        CompletionClient::with_transport(transport),
        persona,
        env_key.map(str::to_string),
    )
}

/// App with no `OPENAI_API_KEY` override, whatever the test environment holds
pub fn app_with(transport: Arc<CannedTransport>, api_key: &str, persona: Persona) -> App {
    app_with_env(transport, api_key, persona, None)
}

/// Poll until the in-flight request has been applied
pub async fn settle(app: &mut App) {
    for _ in 0..200 {
        app.poll_completion();
        if !app.is_loading() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("request never finished");
}
