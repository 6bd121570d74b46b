//! Property values carried by elements and fibers.
//!
//! Equality is per-value: strings and scalars compare by value, handlers
//! compare by identity (two distinct closures with identical bodies are
//! different handlers). No deep comparison is ever performed.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Event payload handed to listeners by an output tree that dispatches events.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: Arc<str>,
    pub value: Option<PropValue>,
}

impl Event {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Shared, identity-compared event callback.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn same(&self, other: &EventHandler) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(Arc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn is_handler(&self) -> bool {
        matches!(self, PropValue::Handler(_))
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Text rendering of a value, as an output tree would show it in a text node.
impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(s) => f.write_str(s),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Arc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Arc::from(value))
    }
}

impl From<Arc<str>> for PropValue {
    fn from(value: Arc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn handlers_compare_by_identity() {
        let a = EventHandler::new(|_| {});
        let b = EventHandler::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(PropValue::Handler(a.clone()), PropValue::Handler(b));
        assert_eq!(PropValue::Handler(a.clone()), PropValue::Handler(a));
    }

    #[test]
    fn scalars_compare_by_value() {
        assert_eq!(PropValue::from("a"), PropValue::from(String::from("a")));
        assert_ne!(PropValue::from(1), PropValue::from(2));
        assert_ne!(PropValue::from(1), PropValue::from("1"));
    }

    #[test]
    fn display_renders_text_content() {
        assert_eq!(PropValue::from("hi").to_string(), "hi");
        assert_eq!(PropValue::from(42).to_string(), "42");
        assert_eq!(PropValue::from(true).to_string(), "true");
        assert_eq!(PropValue::from(1.5).to_string(), "1.5");
    }

    #[test]
    fn handler_call_reaches_closure() {
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let handler = EventHandler::new(move |event| {
            assert_eq!(&*event.name, "click");
            seen.set(seen.get() + 1);
        });
        handler.call(&Event::new("click"));
        handler.call(&Event::new("click"));
        assert_eq!(hits.get(), 2);
    }
}
