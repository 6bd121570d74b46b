//! Property and listener diff between two prop maps of the same node.
//!
//! A property is a listener when its name carries the event prefix and its
//! value is a handler; everything else (including `nodeValue` on text nodes)
//! is a plain property. The diff runs four passes, in this order:
//! 1. detach listeners that are gone or changed,
//! 2. attach listeners that are new or changed,
//! 3. clear plain properties that are gone,
//! 4. assign plain properties that are new or changed.
//!
//! "Changed" is `PropValue` equality: by value for scalars, by identity for
//! handlers.

use core_types::NodeHandle;
use dom::Mutation;
use std::sync::Arc;
use vdom::{EventHandler, PropValue, Props, event_name};

fn listener(name: &str, value: &PropValue) -> Option<(String, EventHandler)> {
    let handler = value.as_handler()?;
    let event = event_name(name)?;
    Some((event, handler.clone()))
}

pub(crate) fn is_plain(name: &str, value: &PropValue) -> bool {
    listener(name, value).is_none()
}

/// Append the mutations turning `prev` into `next` on `node` to `out`.
pub fn diff_props(prev: &Props, next: &Props, node: NodeHandle, out: &mut Vec<Mutation>) {
    for (name, value) in prev.iter() {
        let Some((event, handler)) = listener(name, value) else {
            continue;
        };
        if next.get(name) != Some(value) {
            out.push(Mutation::RemoveListener {
                node,
                event: Arc::from(event),
                handler,
            });
        }
    }

    for (name, value) in next.iter() {
        let Some((event, handler)) = listener(name, value) else {
            continue;
        };
        if prev.get(name) != Some(value) {
            out.push(Mutation::AddListener {
                node,
                event: Arc::from(event),
                handler,
            });
        }
    }

    for (name, value) in prev.iter() {
        if !is_plain(name, value) {
            continue;
        }
        let still_plain = next.get(name).is_some_and(|v| is_plain(name, v));
        if !still_plain {
            out.push(Mutation::RemoveProperty {
                node,
                name: Arc::clone(name),
            });
        }
    }

    for (name, value) in next.iter() {
        if !is_plain(name, value) {
            continue;
        }
        if prev.get(name) != Some(value) {
            out.push(Mutation::SetProperty {
                node,
                name: Arc::clone(name),
                value: value.clone(),
            });
        }
    }
}

/// Mutations that initialize a freshly created node from `props`.
pub fn initial_props(props: &Props, node: NodeHandle) -> Vec<Mutation> {
    let mut out = Vec::with_capacity(props.len());
    diff_props(&Props::new(), props, node, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdom::Element;

    const NODE: NodeHandle = NodeHandle(5);

    fn props_of(el: &Element) -> &Props {
        el.props()
    }

    #[test]
    fn removes_listener_and_updates_title() {
        let f = EventHandler::new(|_| {});
        let prev = Element::new("div").prop("title", "a").on("click", f.clone());
        let next = Element::new("div").prop("title", "b");
        let mut out = Vec::new();
        diff_props(props_of(&prev), props_of(&next), NODE, &mut out);
        assert_eq!(
            out,
            vec![
                Mutation::RemoveListener {
                    node: NODE,
                    event: Arc::from("click"),
                    handler: f,
                },
                Mutation::SetProperty {
                    node: NODE,
                    name: Arc::from("title"),
                    value: PropValue::from("b"),
                },
            ]
        );
    }

    #[test]
    fn unchanged_props_emit_nothing() {
        let f = EventHandler::new(|_| {});
        let el = Element::new("a").prop("href", "/x").on("click", f);
        let mut out = Vec::new();
        diff_props(props_of(&el), props_of(&el.clone()), NODE, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn changed_handler_is_swapped_in_order() {
        let f = EventHandler::new(|_| {});
        let g = EventHandler::new(|_| {});
        let prev = Element::new("button").on("click", f.clone());
        let next = Element::new("button").on("click", g.clone());
        let mut out = Vec::new();
        diff_props(props_of(&prev), props_of(&next), NODE, &mut out);
        assert_eq!(
            out,
            vec![
                Mutation::RemoveListener {
                    node: NODE,
                    event: Arc::from("click"),
                    handler: f,
                },
                Mutation::AddListener {
                    node: NODE,
                    event: Arc::from("click"),
                    handler: g,
                },
            ]
        );
    }

    #[test]
    fn gone_plain_props_are_cleared() {
        let prev = Element::new("input").prop("value", "x").prop("disabled", true);
        let next = Element::new("input").prop("value", "x");
        let mut out = Vec::new();
        diff_props(props_of(&prev), props_of(&next), NODE, &mut out);
        assert_eq!(
            out,
            vec![Mutation::RemoveProperty {
                node: NODE,
                name: Arc::from("disabled"),
            }]
        );
    }

    #[test]
    fn plain_value_replaced_by_handler_under_same_key() {
        let h = EventHandler::new(|_| {});
        let prev = Element::new("div").prop("onClick", "legacy()");
        let next = Element::new("div").on("click", h.clone());
        let mut out = Vec::new();
        diff_props(props_of(&prev), props_of(&next), NODE, &mut out);
        assert_eq!(
            out,
            vec![
                Mutation::AddListener {
                    node: NODE,
                    event: Arc::from("click"),
                    handler: h,
                },
                Mutation::RemoveProperty {
                    node: NODE,
                    name: Arc::from("onClick"),
                },
            ]
        );
    }

    #[test]
    fn initial_props_attach_listeners_before_values() {
        let h = EventHandler::new(|_| {});
        let el = Element::new("button").prop("title", "t").on("click", h);
        let out = initial_props(props_of(&el), NODE);
        let ops: Vec<_> = out.iter().map(Mutation::op).collect();
        assert_eq!(
            ops,
            vec![dom::AdapterOp::AddListener, dom::AdapterOp::SetProperty]
        );
    }
}
