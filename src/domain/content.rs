//! Block-level edits on a node's content.
//!
//! The tree core treats content as opaque; these helpers cover the few block
//! shapes the outline page edits directly (question blocks) or inspects
//! (form blocks, embedded videos).

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::domain::Content;

/// Block `data.type` values that need an interactive form and cannot be answered inline.
const FORM_ONLY_TYPES: [&str; 2] = ["check", "upload"];

const YOUTUBE_PATTERNS: [&str; 3] = [
    r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]+)",
    r"(?:https?://)?(?:www\.)?youtu\.be/([a-zA-Z0-9_-]+)",
    r"(?:https?://)?(?:www\.)?youtube\.com/embed/([a-zA-Z0-9_-]+)",
];

/// Mutable `blocks` array, created when missing.
///
/// A payload that is not a JSON object is replaced by `{"blocks": []}`.
fn blocks_mut(content: &mut Content) -> Option<&mut Vec<Value>> {
    let value = content.as_value_mut();
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    let blocks = value
        .as_object_mut()?
        .entry("blocks")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !blocks.is_array() {
        *blocks = Value::Array(Vec::new());
    }
    blocks.as_array_mut()
}

fn question_items_mut(content: &mut Content, question: usize) -> Option<&mut Vec<Value>> {
    blocks_mut(content)?
        .get_mut(question)?
        .get_mut("items")?
        .as_array_mut()
}

/// Append `block` to the content's blocks.
pub fn append_block(content: &mut Content, block: Value) {
    if let Some(blocks) = blocks_mut(content) {
        blocks.push(block);
    }
}

/// Append an empty question block whose single option is also its answer.
pub fn add_question(content: &mut Content, option_id: &str) {
    if let Some(blocks) = blocks_mut(content) {
        blocks.push(json!({
            "content": "",
            "items": [{ "id": option_id, "text": "" }],
            "type": "question",
            "answer": option_id,
        }));
    }
}

/// Append an empty option to the question at `question`. Returns false if there is none.
pub fn add_option(content: &mut Content, question: usize, option_id: &str) -> bool {
    match question_items_mut(content, question) {
        Some(items) => {
            items.push(json!({ "text": "", "id": option_id }));
            true
        }
        None => false,
    }
}

/// Remove the block at `index`. Out of range is a no-op.
pub fn remove_question(content: &mut Content, index: usize) -> bool {
    match blocks_mut(content) {
        Some(blocks) if index < blocks.len() => {
            blocks.remove(index);
            true
        }
        _ => false,
    }
}

/// Remove option `option` of the question at `question`. Out of range is a no-op.
pub fn remove_option(content: &mut Content, question: usize, option: usize) -> bool {
    match question_items_mut(content, question) {
        Some(items) if option < items.len() => {
            items.remove(option);
            true
        }
        _ => false,
    }
}

/// Whether the content can be answered inline (no check/upload form blocks).
pub fn is_inline_form(content: &Content) -> bool {
    !content.blocks().iter().any(|block| {
        block
            .get("data")
            .and_then(|data| data.get("type"))
            .and_then(Value::as_str)
            .is_some_and(|kind| FORM_ONLY_TYPES.contains(&kind))
    })
}

fn youtube_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        YOUTUBE_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// Video id of a YouTube watch, short or embed URL.
pub fn youtube_video_id(url: &str) -> Option<String> {
    youtube_patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
