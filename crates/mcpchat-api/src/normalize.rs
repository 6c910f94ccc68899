//! History normalization: backend-neutral turns to plain-text wire turns.
//!
//! Only `text` blocks survive. Everything else is dropped from block
//! sequences; shapes that cannot be read as text are stringified and logged.

use mcpchat_types::{ContentBlock, Turn, TurnContent, WireTurn};
use serde_json::Value;

/// Flatten every turn into a wire turn, one for one, preserving order and role.
pub fn normalize(history: &[Turn]) -> Vec<WireTurn> {
    history
        .iter()
        .map(|turn| WireTurn::new(turn.role, flatten_content(&turn.content)))
        .collect()
}

/// Reduce turn content to the text the backend will see.
pub fn flatten_content(content: &TurnContent) -> String {
    match content {
        TurnContent::Text(text) => text.clone(),
        TurnContent::Blocks(blocks) => join_text(blocks.iter().filter_map(block_text)),
        TurnContent::Block(ContentBlock::Text { text }) => text.clone(),
        TurnContent::Block(block) => {
            tracing::warn!("Coercing non-text content block to a string: {block:?}");
            serde_json::to_string(block).unwrap_or_default()
        }
        TurnContent::Other(value) => flatten_value(value),
    }
}

fn block_text(block: &ContentBlock) -> Option<&str> {
    match block {
        ContentBlock::Text { text } => Some(text.as_str()),
        _ => None,
    }
}

/// Newline-join, skipping empty parts.
fn join_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Loosely-shaped content that did not deserialize into a known variant.
fn flatten_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(items) => join_text(items.iter().filter_map(value_text)),
        Value::Object(_) => match value_text(value) {
            Some(text) => text.to_string(),
            None => {
                tracing::warn!("Coercing unrecognized turn content to a string: {value}");
                value.to_string()
            }
        },
        other => {
            tracing::warn!("Coercing non-string turn content to a string: {other}");
            other.to_string()
        }
    }
}

/// Text of a JSON object whose `type` is `text`; a missing `text` reads as "".
fn value_text(value: &Value) -> Option<&str> {
    if value.get("type")?.as_str()? != "text" {
        return None;
    }
    Some(value.get("text").and_then(Value::as_str).unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpchat_types::Role;
    use serde_json::json;

    #[test]
    fn plain_strings_are_identity() {
        let history = vec![
            Turn::user("Hi"),
            Turn::assistant("Hello"),
            Turn::new(Role::System, "rules"),
            Turn::user(""),
        ];
        let wire = normalize(&history);
        assert_eq!(wire.len(), history.len());
        for (turn, wire_turn) in history.iter().zip(&wire) {
            assert_eq!(turn.role, wire_turn.role);
            assert_eq!(turn.content, TurnContent::Text(wire_turn.content.clone()));
        }
    }

    #[test]
    fn text_blocks_join_with_newline() {
        let history = vec![Turn::new(
            Role::User,
            vec![
                ContentBlock::text("A"),
                ContentBlock::Unsupported,
                ContentBlock::text("B"),
            ],
        )];
        assert_eq!(normalize(&history)[0].content, "A\nB");
    }

    #[test]
    fn image_block_from_json_is_dropped() {
        let turn: Turn = serde_json::from_value(json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "A"},
                {"type": "image", "url": "x"},
                {"type": "text", "text": "B"}
            ]
        }))
        .unwrap();
        assert_eq!(normalize(&[turn])[0].content, "A\nB");
    }

    #[test]
    fn empty_text_blocks_are_skipped() {
        let turn = Turn::new(
            Role::Assistant,
            vec![
                ContentBlock::text(""),
                ContentBlock::text("only"),
                ContentBlock::text(""),
            ],
        );
        assert_eq!(flatten_content(&turn.content), "only");
    }

    #[test]
    fn tool_blocks_contribute_nothing() {
        let content = TurnContent::Blocks(vec![
            ContentBlock::ToolUse {
                id: "t1".into(),
                name: "read_doc".into(),
                input: json!({}),
            },
            ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: json!("contents"),
                is_error: None,
            },
        ]);
        assert_eq!(flatten_content(&content), "");
    }

    #[test]
    fn single_text_block_unwraps() {
        let content = TurnContent::Block(ContentBlock::text("solo"));
        assert_eq!(flatten_content(&content), "solo");
    }

    #[test]
    fn single_non_text_block_is_stringified() {
        let content = TurnContent::Block(ContentBlock::Thinking {
            thinking: "hmm".into(),
        });
        let flattened = flatten_content(&content);
        let parsed: Value = serde_json::from_str(&flattened).unwrap();
        assert_eq!(parsed["type"], "thinking");
        assert_eq!(parsed["thinking"], "hmm");
    }

    #[test]
    fn single_image_block_from_json_keeps_its_data() {
        let turn: Turn = serde_json::from_value(json!({
            "role": "user",
            "content": {"type": "image", "url": "https://x/cat.png"}
        }))
        .unwrap();
        let wire = normalize(&[turn]);
        let parsed: Value = serde_json::from_str(&wire[0].content).unwrap();
        assert_eq!(parsed, json!({"type": "image", "url": "https://x/cat.png"}));
    }

    #[test]
    fn loose_array_keeps_text_objects_only() {
        let content = TurnContent::Other(json!([
            {"type": "text", "text": "A"},
            "stray",
            7,
            {"type": "text"},
            {"type": "text", "text": "B"}
        ]));
        assert_eq!(flatten_content(&content), "A\nB");
    }

    #[test]
    fn scalar_content_is_stringified() {
        assert_eq!(flatten_content(&TurnContent::Other(json!(42))), "42");
        assert_eq!(flatten_content(&TurnContent::Other(json!(true))), "true");
        assert_eq!(flatten_content(&TurnContent::Other(Value::Null)), "");
    }

    #[test]
    fn roles_and_order_survive() {
        let history = vec![
            Turn::user("1"),
            Turn::new(Role::Assistant, vec![ContentBlock::Unsupported]),
            Turn::user("3"),
        ];
        let wire = normalize(&history);
        let roles: Vec<Role> = wire.iter().map(|w| w.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(wire[1].content, "");
        assert_eq!(wire[2].content, "3");
    }
}
