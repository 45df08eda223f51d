use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::warn;

use menuchat_core::config::env_api_key;
use menuchat_core::{
    build_prompt, can_send, ChatModel, CompletionClient, CompletionRequest, CompletionSession,
    CopyFeedback, Persona, PreferenceStore, Preferences, PromptInputs, PromptMode,
};

use crate::clipboard::SystemClipboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    ApiKey,
    /// First input of the active mode
    Primary,
    /// Main-idea input, Reply mode only
    Secondary,
    Response,
}

/// Editable text with a cursor counted in chars
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    pub text: String,
    pub cursor: usize,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl InputField {
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert_str(byte_pos, s);
        self.cursor += s.chars().count();
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(byte_pos);
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.text.chars().count() {
            return false;
        }
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(byte_pos);
        true
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,
    pub mode: PromptMode,

    // Per-mode inputs, kept when switching modes
    pub quick: InputField,
    pub reword: InputField,
    pub reply_to: InputField,
    pub reply_idea: InputField,

    /// Stored key; `OPENAI_API_KEY` overrides it without being shown or saved
    pub api_key: InputField,
    pub model: ChatModel,
    pub persona: Persona,

    pub response: String,
    pub response_scroll: u16,
    pub error_message: Option<String>,
    pub copy_feedback: CopyFeedback,
    pub clipboard: SystemClipboard,

    pub show_model_picker: bool,
    pub model_picker_state: ListState,

    pub animation_frame: u8,

    // Updated during render for mouse hit-testing
    pub response_area: Option<Rect>,

    env_api_key: Option<String>,
    prefs: Preferences<Box<dyn PreferenceStore>>,
    client: CompletionClient,
    session: CompletionSession,
}

impl App {
    pub fn new(
        prefs: Preferences<Box<dyn PreferenceStore>>,
        client: CompletionClient,
        persona: Persona,
    ) -> Self {
        Self::with_env_key(prefs, client, persona, env_api_key())
    }

    pub(crate) fn with_env_key(
        prefs: Preferences<Box<dyn PreferenceStore>>,
        client: CompletionClient,
        persona: Persona,
        env_api_key: Option<String>,
    ) -> Self {
        let api_key = prefs.api_key();
        let model = prefs.model();

        Self {
            should_quit: false,
            focus: Focus::Primary,
            mode: PromptMode::default(),

            quick: InputField::default(),
            reword: InputField::default(),
            reply_to: InputField::default(),
            reply_idea: InputField::default(),

            api_key: InputField::with_text(api_key),
            model,
            persona,

            response: String::new(),
            response_scroll: 0,
            error_message: None,
            copy_feedback: CopyFeedback::default(),
            clipboard: SystemClipboard::new(),

            show_model_picker: false,
            model_picker_state: ListState::default(),

            animation_frame: 0,

            response_area: None,

            env_api_key,
            prefs,
            client,
            session: CompletionSession::new(),
        }
    }

    pub fn inputs(&self) -> PromptInputs {
        PromptInputs {
            quick: self.quick.text.clone(),
            reword: self.reword.text.clone(),
            reply_to: self.reply_to.text.clone(),
            reply_idea: self.reply_idea.text.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_pending()
    }

    pub fn api_key_from_env(&self) -> bool {
        self.env_api_key.is_some()
    }

    /// Key sent with requests: the environment override, else the field
    pub fn effective_api_key(&self) -> &str {
        self.env_api_key.as_deref().unwrap_or(&self.api_key.text)
    }

    /// Send is offered when idle and the mode's fields are filled. A missing
    /// key is reported by the client.
    pub fn can_send(&self) -> bool {
        !self.is_loading() && can_send(self.mode, &self.inputs())
    }

    pub fn send(&mut self) {
        if !self.can_send() {
            return;
        }

        self.error_message = None;
        self.response.clear();
        self.response_scroll = 0;
        self.copy_feedback.clear();

        let prompt = build_prompt(self.mode, &self.inputs());
        let request = CompletionRequest::new(prompt, self.effective_api_key(), self.model.as_str())
            .with_system_instruction(self.persona.system_instruction());

        if let Err(err) = self.session.submit(&self.client, request) {
            self.error_message = Some(err.to_string());
        }
    }

    /// Apply a finished result, if there is one
    pub fn poll_completion(&mut self) {
        if let Some(result) = self.session.try_take() {
            match result {
                Ok(text) => self.response = text,
                Err(err) => self.error_message = Some(err.to_string()),
            }
        }
    }

    pub fn tick(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
        self.poll_completion();
    }

    /// Fields reachable with Tab, in order, for the current mode
    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::ApiKey, Focus::Primary];
        if self.mode == PromptMode::Reply {
            order.push(Focus::Secondary);
        }
        if !self.response.is_empty() {
            order.push(Focus::Response);
        }
        order
    }

    pub fn focus_next(&mut self) {
        let order = self.focus_order();
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(i + 1) % order.len()];
    }

    pub fn focus_prev(&mut self) {
        let order = self.focus_order();
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(i + order.len() - 1) % order.len()];
    }

    pub fn cycle_mode(&mut self) {
        self.mode = self.mode.next();
        if self.focus == Focus::Secondary && self.mode != PromptMode::Reply {
            self.focus = Focus::Primary;
        }
    }

    pub fn primary_label(&self) -> &'static str {
        match self.mode {
            PromptMode::Quick => "Ask anything",
            PromptMode::Reword => "Text to reword",
            PromptMode::Reply => "Content to reply to (paste here)",
        }
    }

    pub fn primary_field(&self) -> &InputField {
        match self.mode {
            PromptMode::Quick => &self.quick,
            PromptMode::Reword => &self.reword,
            PromptMode::Reply => &self.reply_to,
        }
    }

    /// The text input under focus, if focus is on one
    pub fn focused_field_mut(&mut self) -> Option<&mut InputField> {
        match self.focus {
            Focus::ApiKey => Some(&mut self.api_key),
            Focus::Primary => Some(match self.mode {
                PromptMode::Quick => &mut self.quick,
                PromptMode::Reword => &mut self.reword,
                PromptMode::Reply => &mut self.reply_to,
            }),
            Focus::Secondary => Some(&mut self.reply_idea),
            Focus::Response => None,
        }
    }

    /// Persist the API key field as typed
    pub fn api_key_edited(&mut self) {
        if let Err(err) = self.prefs.set_api_key(&self.api_key.text) {
            warn!(error = %err, "failed to save API key");
            self.error_message = Some(format!("Could not save API key: {}", err));
        }
    }

    pub fn copy_response(&mut self, now: Instant) {
        if self.response.is_empty() {
            return;
        }
        match self.clipboard.copy(&self.response) {
            Ok(()) => self.copy_feedback.mark(now),
            Err(err) => self.error_message = Some(format!("Copy failed: {}", err)),
        }
    }

    pub fn scroll_response_down(&mut self) {
        self.response_scroll = self.response_scroll.saturating_add(1);
    }

    pub fn scroll_response_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }

    // Model picker methods
    pub fn open_model_picker(&mut self) {
        let current = ChatModel::all().iter().position(|m| *m == self.model);
        self.model_picker_state.select(current.or(Some(0)));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = ChatModel::all().len();
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(model) = self
            .model_picker_state
            .selected()
            .and_then(|i| ChatModel::all().get(i).copied())
        {
            self.model = model;
            self.show_model_picker = false;
            if let Err(err) = self.prefs.set_model(model) {
                warn!(error = %err, "failed to save model choice");
                self.error_message = Some(format!("Could not save model: {}", err));
            }
        }
    }
}
