//! Convert E-utilities XML into generic tree values.
//!
//! Records coming back from efetch vary a lot in shape, so instead of typed
//! structs every `PubmedArticle` becomes a `serde_json::Value` tree:
//!
//! - an element with only text and no attributes becomes a string
//! - any other element becomes an object with attributes under `"@name"`,
//!   child elements under their tag name and non-blank text under `"#text"`
//! - repeated sibling tags collapse into an array
//! - inline markup (`<i>`, `<sup>`, ...) is flattened into the surrounding text

use crate::error::{PubmedError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Formatting tags PubMed allows inside titles and abstracts.
const INLINE_TAGS: &[&[u8]] = &[b"i", b"b", b"u", b"sup", b"sub", b"mml:math"];

struct Frame {
    name: String,
    node: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut node = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| PubmedError::Parse(format!("Bad attribute in <{}>: {}", name, e)))?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr
                .unescape_value()
                .map_err(|e| PubmedError::Parse(format!("Bad attribute value in <{}>: {}", name, e)))?;
            node.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            node,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.node.is_empty() {
            Value::String(text.to_string())
        } else {
            let mut node = self.node;
            if !text.is_empty() {
                node.insert("#text".to_string(), Value::String(text.to_string()));
            }
            Value::Object(node)
        };
        (self.name, value)
    }
}

fn is_inline(name: &[u8]) -> bool {
    INLINE_TAGS.contains(&name)
}

/// Insert `value` under `key`, turning repeated keys into an array.
fn insert_child(node: &mut Map<String, Value>, key: String, value: Value) {
    match node.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            node.insert(key, value);
        }
    }
}

/// Parse a whole XML document into `(root tag, tree)`.
pub fn parse_document(xml: &str) -> Result<(String, Value)> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    // depth inside inline markup; those tags contribute text only
    let mut inline_depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| PubmedError::Parse(format!("XML error at {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(e) => {
                if inline_depth > 0 || (!stack.is_empty() && is_inline(e.name().as_ref())) {
                    inline_depth += 1;
                } else {
                    stack.push(Frame::open(&e)?);
                }
            }
            Event::Empty(e) => {
                if inline_depth > 0 || is_inline(e.name().as_ref()) {
                    continue;
                }
                let (name, value) = Frame::open(&e)?.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.node, name, value),
                    None => return Ok((name, value)),
                }
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| PubmedError::Parse(format!("Bad text content: {}", e)))?;
                    frame.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if inline_depth > 0 {
                    inline_depth -= 1;
                    continue;
                }
                let frame = stack
                    .pop()
                    .ok_or_else(|| PubmedError::Parse("Unbalanced closing tag".to_string()))?;
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.node, name, value),
                    None => return Ok((name, value)),
                }
            }
            Event::Eof => {
                return Err(PubmedError::Parse(
                    "XML document ended before its root element closed".to_string(),
                ))
            }
            _ => {}
        }
    }
}

/// View a value as a list: arrays as their items, anything else as one item.
pub fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Split an efetch `PubmedArticleSet` document into one tree per article.
pub fn parse_article_set(xml: &str) -> Result<Vec<Value>> {
    let (root, tree) = parse_document(xml)?;
    if root != "PubmedArticleSet" {
        return Err(PubmedError::Parse(format!(
            "Expected <PubmedArticleSet>, found <{}>",
            root
        )));
    }

    match tree {
        Value::Object(mut node) => {
            if let Some(books) = node.get("PubmedBookArticle") {
                tracing::debug!(count = as_list(books).len(), "Skipping book records");
            }
            Ok(match node.remove("PubmedArticle") {
                Some(Value::Array(items)) => items,
                Some(single) => vec![single],
                None => Vec::new(),
            })
        }
        // <PubmedArticleSet/> or whitespace only
        _ => Ok(Vec::new()),
    }
}
