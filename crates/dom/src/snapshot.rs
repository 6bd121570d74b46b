use crate::memory::{MemoryDom, NodeKind};
use core_types::NodeHandle;
use std::fmt::{self, Write};
use vdom::{Element, ElementType, NODE_VALUE_KEY, PropValue, event_name};

/// Deterministic line-based serialization of an output subtree.
/// Not a stable format; intended for test comparisons and demo output.
///
/// Equivalence rules:
/// - Tag names must match; text nodes must match exactly.
/// - Plain properties are listed in name order with their values.
/// - Listeners are listed by event name only (`@click`), sorted; handler
///   identity is not part of the snapshot.
/// - Child order is significant.
///
/// The same format can be produced from an `Element`, so a committed tree
/// can be checked against the description it was rendered from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSnapshot {
    lines: Vec<String>,
}

impl OutputSnapshot {
    /// Snapshot `node` and its subtree.
    pub fn from_dom(dom: &MemoryDom, node: NodeHandle) -> Self {
        let mut lines = Vec::new();
        walk_dom(dom, node, 0, &mut lines);
        Self { lines }
    }

    /// Snapshot every child of a container, in order, without the container line.
    pub fn from_container(dom: &MemoryDom, container: NodeHandle) -> Self {
        let mut lines = Vec::new();
        for child in dom.children(container) {
            walk_dom(dom, *child, 0, &mut lines);
        }
        Self { lines }
    }

    pub fn from_element(element: &Element) -> Self {
        let mut lines = Vec::new();
        walk_element(element, 0, &mut lines);
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for OutputSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

fn walk_dom(dom: &MemoryDom, node: NodeHandle, depth: usize, out: &mut Vec<String>) {
    let line = match dom.node(node) {
        Some(NodeKind::Root) => "#root".to_string(),
        Some(NodeKind::Element {
            name,
            props,
            listeners,
        }) => {
            let mut events: Vec<&str> = listeners.iter().map(|(event, _)| &**event).collect();
            events.sort_unstable();
            element_line(name, props.iter().map(|(k, v)| (&**k, v)), &events)
        }
        Some(NodeKind::Text { text }) => quoted(text),
        None => format!("#missing({})", node.0),
    };
    out.push(format!("{}{}", "  ".repeat(depth), line));
    for child in dom.children(node) {
        walk_dom(dom, *child, depth + 1, out);
    }
}

fn walk_element(element: &Element, depth: usize, out: &mut Vec<String>) {
    let line = match element.ty() {
        ElementType::Text => {
            let text = element
                .props()
                .get(NODE_VALUE_KEY)
                .map(PropValue::to_string)
                .unwrap_or_default();
            quoted(&text)
        }
        ElementType::Tag(name) => {
            let mut plain = Vec::new();
            let mut events = Vec::new();
            for (key, value) in element.props().iter() {
                match event_name(key) {
                    Some(event) if value.is_handler() => events.push(event),
                    _ => plain.push((&**key, value)),
                }
            }
            events.sort_unstable();
            let events: Vec<&str> = events.iter().map(String::as_str).collect();
            element_line(name, plain.into_iter(), &events)
        }
    };
    out.push(format!("{}{}", "  ".repeat(depth), line));
    for child in element.child_elements() {
        walk_element(child, depth + 1, out);
    }
}

fn element_line<'a>(
    name: &str,
    props: impl Iterator<Item = (&'a str, &'a PropValue)>,
    events: &[&str],
) -> String {
    let mut line = String::new();
    let _ = write!(&mut line, "<{name}");
    for (key, value) in props {
        match value {
            PropValue::Str(s) => {
                let _ = write!(&mut line, " {key}={}", quoted(s));
            }
            other => {
                let _ = write!(&mut line, " {key}={other}");
            }
        }
    }
    for event in events {
        let _ = write!(&mut line, " @{event}");
    }
    line.push('>');
    line
}

fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
