use serde::{Deserialize, Serialize};

/// The author of a turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user.
    User,
    /// Text produced by the model.
    Model,
}

/// One piece of a turn. Only text parts are produced or consumed here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Part {
    /// The text content, absent for non-text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// A turn (or a system instruction) made of ordered parts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content {
    /// The author of the content. Omitted for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The ordered parts that make up the content.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a single-part text turn for the given role.
    pub fn new_with_text(text: impl Into<String>, role: Role) -> Self {
        Self {
            role: Some(role),
            parts: vec![Part::text(text)],
        }
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new_with_text(text, Role::User)
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new_with_text(text, Role::Model)
    }

    /// Create a role-less system instruction.
    pub fn system_instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenates the text of every text part, or `None` when no part carries text.
    pub fn text(&self) -> Option<String> {
        let mut texts = self.parts.iter().filter_map(|p| p.text.as_deref()).peekable();
        texts.peek()?;
        Some(texts.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn user_turn_serialization() {
        let json = to_value(Content::user("Tell me a joke")).unwrap();
        assert_eq!(
            json,
            json!({
                "role": "user",
                "parts": [{"text": "Tell me a joke"}]
            })
        );
    }

    #[test]
    fn system_instruction_has_no_role() {
        let json = to_value(Content::system_instruction("a grumpy pirate")).unwrap();
        assert_eq!(json, json!({"parts": [{"text": "a grumpy pirate"}]}));
    }

    #[test]
    fn text_joins_parts_and_skips_non_text() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [{"text": "Arr, "}, {"inlineData": {}}, {"text": "matey"}]
        }))
        .unwrap();
        assert_eq!(content.text().as_deref(), Some("Arr, matey"));
    }

    #[test]
    fn text_is_none_without_text_parts() {
        let content = Content {
            role: Some(Role::Model),
            parts: vec![Part::default()],
        };
        assert!(content.text().is_none());
    }
}
