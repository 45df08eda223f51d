/// Fixed style directive sent as the system message by the professor persona.
pub const PROFESSOR_INSTRUCTION: &str = "\
You are a university professor. Keep your answers concise and formal. Write in a natural, human way—use plain language and avoid flowery or overly elaborate wording. Get to the point without unnecessary flourish.

Output only the requested content. Do not add any preamble, labels, or meta-commentary (e.g. no \"Here's my response:\", \"Reply:\", \"Reworded version:\", or similar). Reply with the content itself only.

Provide exactly one version your single best answer. Do not offer multiple options or alternatives for the user to choose from.";

/// Response style applied to every request from a front-end.
///
/// `Plain` sends the prompt alone; `Professor` prepends a system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persona {
    #[default]
    Plain,
    Professor,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Plain => "plain",
            Persona::Professor => "professor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" => Some(Persona::Plain),
            "professor" => Some(Persona::Professor),
            _ => None,
        }
    }

    pub fn all() -> Vec<Persona> {
        vec![Persona::Plain, Persona::Professor]
    }

    pub fn system_instruction(&self) -> Option<&'static str> {
        match self {
            Persona::Plain => None,
            Persona::Professor => Some(PROFESSOR_INSTRUCTION),
        }
    }
}
