use crate::ai::{Conversation, Message, Role};
use crate::models::ConversionRequest;

pub const SLIDES_SYSTEM: &str = include_str!("../data/prompts/slides_system.txt");
pub const SLIDES_USER: &str = include_str!("../data/prompts/slides_user.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Build the system + user conversation asking the model for a slide deck.
pub fn build_conversation(request: &ConversionRequest) -> Conversation {
    Conversation {
        messages: vec![
            Message {
                role: Role::System,
                content: SLIDES_SYSTEM.to_string(),
            },
            Message {
                role: Role::User,
                content: render(SLIDES_USER, &[("text", request.raw_text())]),
            },
        ],
    }
}
