use crate::types::{
    Content, GenerateContentRequest, GenerationConfig, ImagePayload, Part, Turn, WireRole,
};

/// The two call shapes the remote service accepts
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedRequest {
    /// Single combined-content call used when an image is attached
    SingleTurn { parts: Vec<Part> },
    /// Chat continuation seeded with prior history
    Chat {
        history: Vec<Content>,
        message: String,
    },
}

/// Shape a user-composed message for the remote service.
///
/// Image requests are single-turn: prior history is ignored entirely. This
/// is documented behavior, not an oversight.
pub fn shape_request(
    message: &str,
    image: Option<&ImagePayload>,
    prior_turns: &[Turn],
) -> ShapedRequest {
    match image {
        Some(image) => ShapedRequest::SingleTurn {
            parts: vec![
                Part::text(message.to_string()),
                Part::inline_image(image.data.clone()),
            ],
        },
        None => ShapedRequest::Chat {
            history: shape_history(prior_turns),
            message: message.to_string(),
        },
    }
}

/// Map prior turns into the remote vocabulary and enforce the history-start
/// constraint: the remote service rejects histories that open with a model
/// entry, so leading model entries are stripped until the head is a user
/// entry or the history is empty.
pub fn shape_history(turns: &[Turn]) -> Vec<Content> {
    let mut history: Vec<Content> = turns
        .iter()
        .map(|turn| Content {
            parts: vec![Part::text(turn.content.clone())],
            role: Some(WireRole::from(turn.role)),
        })
        .collect();

    let leading = history
        .iter()
        .take_while(|entry| entry.role == Some(WireRole::Model))
        .count();
    history.drain(..leading);

    history
}

impl ShapedRequest {
    /// Build the final wire request. For the chat shape the new message is
    /// appended after the history as the closing user entry.
    pub fn into_request(self, system_prompt: Option<&str>) -> GenerateContentRequest {
        let system_instruction = system_prompt.map(|prompt| Content {
            parts: vec![Part::text(prompt.to_string())],
            role: None,
        });

        let contents = match self {
            ShapedRequest::SingleTurn { parts } => vec![Content {
                parts,
                role: Some(WireRole::User),
            }],
            ShapedRequest::Chat {
                mut history,
                message,
            } => {
                history.push(Content {
                    parts: vec![Part::text(message)],
                    role: Some(WireRole::User),
                });
                history
            }
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
            }),
        }
    }
}
