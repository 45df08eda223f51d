/// Chat models offered in the model picker. The identifier is passed through
/// to the completion service as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatModel {
    Gpt52,
    #[default]
    Gpt5Mini,
}

impl ChatModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModel::Gpt52 => "gpt-5.2",
            ChatModel::Gpt5Mini => "gpt-5-mini",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gpt-5.2" => Some(ChatModel::Gpt52),
            "gpt-5-mini" => Some(ChatModel::Gpt5Mini),
            _ => None,
        }
    }

    pub fn all() -> Vec<ChatModel> {
        vec![ChatModel::Gpt52, ChatModel::Gpt5Mini]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChatModel::Gpt52 => "GPT-5.2",
            ChatModel::Gpt5Mini => "GPT-5 Mini",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_round_trip_through_from_str() {
        for model in ChatModel::all() {
            assert_eq!(ChatModel::from_str(model.as_str()), Some(model));
        }
    }

    #[test]
    fn test_unknown_identifier_is_rejected() {
        assert_eq!(ChatModel::from_str("GPT-5 Mini"), None);
        assert_eq!(ChatModel::from_str(""), None);
        assert_eq!(ChatModel::default(), ChatModel::Gpt5Mini);
    }
}
