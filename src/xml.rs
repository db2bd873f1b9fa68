//! Hand-built XML: one element per field, arrays as repeated siblings (an empty
//! array as one empty element), no attributes.

use serde_json::Value;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT: &str = "  ";

pub struct XmlWriter {
    buf: String,
    depth: usize,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        let mut buf = String::with_capacity(4096);
        buf.push_str(DECLARATION);
        buf.push('\n');
        Self { buf, depth: 0 }
    }

    pub fn open(&mut self, name: &str) {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(&element_name(name));
        self.buf.push_str(">\n");
        self.depth += 1;
    }

    pub fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.buf.push_str("</");
        self.buf.push_str(&element_name(name));
        self.buf.push_str(">\n");
    }

    pub fn leaf(&mut self, name: &str, text: &str) {
        let name = element_name(name);
        self.indent();
        self.buf.push('<');
        self.buf.push_str(&name);
        self.buf.push('>');
        self.buf.push_str(&escape_text(text));
        self.buf.push_str("</");
        self.buf.push_str(&name);
        self.buf.push_str(">\n");
    }

    /// Writes `value` as the element(s) named `name`.
    pub fn field(&mut self, name: &str, value: &Value) {
        match value {
            Value::Object(map) => {
                self.open(name);
                for (key, child) in map {
                    self.field(key, child);
                }
                self.close(name);
            }
            Value::Array(items) if items.is_empty() => self.leaf(name, ""),
            Value::Array(items) => {
                for item in items {
                    self.field(name, item);
                }
            }
            scalar => self.leaf(name, &scalar_text(scalar)),
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
    }
}

/// Renders a JSON document under `root`. A top-level array becomes repeated
/// `item` elements; a top-level object contributes one child per field.
pub fn render_document(root: &str, item: &str, value: &Value) -> String {
    let mut w = XmlWriter::new();
    w.open(root);
    match value {
        Value::Array(items) => {
            for entry in items {
                w.field(item, entry);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                w.field(key, child);
            }
        }
        scalar => w.leaf(item, &scalar_text(scalar)),
    }
    w.close(root);
    w.finish()
}

pub fn fallback_xml(message: &str, timestamp: &str) -> String {
    let mut w = XmlWriter::new();
    w.open("Error");
    w.leaf("Message", message);
    w.leaf("Timestamp", timestamp);
    w.leaf("Status", "fallback");
    w.close("Error");
    w.finish()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Maps an arbitrary key onto a legal element name.
pub fn element_name(key: &str) -> String {
    let mut out: String = key
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let starts_ok = out
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if !starts_ok {
        out.insert(0, '_');
    }
    out
}
