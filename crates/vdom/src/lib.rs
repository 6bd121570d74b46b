//! # vdom
//!
//! Immutable element trees describing a desired output tree.
//!
//! Elements are plain data, rebuilt on every render and never mutated after
//! construction. The reconciler only reads them.

mod element;
mod value;

pub use element::{
    CHILDREN_KEY, Child, EVENT_PREFIX, Element, ElementType, NODE_VALUE_KEY, Props, create_element,
    create_text_element, event_name,
};
pub use value::{Event, EventHandler, PropValue};
