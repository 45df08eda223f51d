//! Prompt assembly for each interaction mode
//!
//! A mode decides which raw input fields are active and how they are combined
//! into the single user-role message sent to the completion service. Nothing in
//! here validates or trims the text that ends up in the prompt; `can_send` is the
//! gate the front-end checks before building one.

/// The interaction style selected in the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    Quick,
    Reword,
    Reply,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::Quick => "Quick",
            PromptMode::Reword => "Reword",
            PromptMode::Reply => "Reply",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quick" => Some(PromptMode::Quick),
            "reword" => Some(PromptMode::Reword),
            "reply" => Some(PromptMode::Reply),
            _ => None,
        }
    }

    pub fn all() -> Vec<PromptMode> {
        vec![PromptMode::Quick, PromptMode::Reword, PromptMode::Reply]
    }

    /// The mode after this one, wrapping back to Quick
    pub fn next(&self) -> Self {
        match self {
            PromptMode::Quick => PromptMode::Reword,
            PromptMode::Reword => PromptMode::Reply,
            PromptMode::Reply => PromptMode::Quick,
        }
    }
}

/// Raw text for every mode. Switching modes leaves the other fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptInputs {
    pub quick: String,
    pub reword: String,
    /// Content being replied to (pasted by the user)
    pub reply_to: String,
    /// The user's main idea for the reply
    pub reply_idea: String,
}

impl PromptInputs {
    pub fn quick(text: impl Into<String>) -> Self {
        Self {
            quick: text.into(),
            ..Self::default()
        }
    }

    pub fn reword(text: impl Into<String>) -> Self {
        Self {
            reword: text.into(),
            ..Self::default()
        }
    }

    pub fn reply(reply_to: impl Into<String>, reply_idea: impl Into<String>) -> Self {
        Self {
            reply_to: reply_to.into(),
            reply_idea: reply_idea.into(),
            ..Self::default()
        }
    }
}

/// Combine the active fields of `mode` into the outbound prompt
pub fn build_prompt(mode: PromptMode, inputs: &PromptInputs) -> String {
    match mode {
        PromptMode::Quick => inputs.quick.clone(),
        PromptMode::Reword => format!("reword\n{}", inputs.reword),
        PromptMode::Reply => format!(
            "Here is the content I need to reply to:\n\
             \n\
             {}\n\
             \n\
             My main idea for the reply:\n\
             \n\
             {}\n\
             \n\
             Please help me write a reply based on the above.",
            inputs.reply_to, inputs.reply_idea
        ),
    }
}

/// True when every field the mode needs has non-whitespace content
pub fn can_send(mode: PromptMode, inputs: &PromptInputs) -> bool {
    let filled = |s: &str| !s.trim().is_empty();
    match mode {
        PromptMode::Quick => filled(&inputs.quick),
        PromptMode::Reword => filled(&inputs.reword),
        PromptMode::Reply => filled(&inputs.reply_to) && filled(&inputs.reply_idea),
    }
}
