//! Render fixture corpus.
//!
//! A fixture case is a sequence of element trees rendered one after another
//! into the same container, each step optionally carrying the expected
//! output snapshot and commit counts. The corpus is kept in two mirrored
//! files (TOML for editing, JSON for tooling) that must stay identical.

use serde::Deserialize;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use vdom::{Element, EventHandler, PropValue};

pub const FIXTURE_FORMAT_V1: &str = "fiberdom-fixtures-v1";

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct FixtureCorpus {
    format: String,
    #[serde(rename = "case")]
    cases: Vec<FixtureCase>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FixtureCase {
    pub id: String,
    pub steps: Vec<FixtureStep>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FixtureStep {
    pub tree: FixtureNode,
    /// Expected container snapshot lines after this step commits.
    #[serde(default)]
    pub expect: Option<Vec<String>>,
    #[serde(default)]
    pub placements: Option<usize>,
    #[serde(default)]
    pub updates: Option<usize>,
    #[serde(default)]
    pub deletions: Option<usize>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FixtureNode {
    Text {
        text: FixtureValue,
    },
    Element {
        tag: String,
        #[serde(default)]
        props: BTreeMap<String, FixtureValue>,
        /// Event name to handler name; equal names share one handler.
        #[serde(default)]
        on: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<FixtureNode>,
    },
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FixtureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&FixtureValue> for PropValue {
    fn from(value: &FixtureValue) -> Self {
        match value {
            FixtureValue::Bool(b) => PropValue::from(*b),
            FixtureValue::Int(i) => PropValue::from(*i),
            FixtureValue::Float(f) => PropValue::from(*f),
            FixtureValue::Str(s) => PropValue::from(s.as_str()),
        }
    }
}

impl FixtureNode {
    /// Build the element tree, resolving handler names through `handlers`.
    pub fn to_element(&self, handlers: &mut HandlerPool) -> Element {
        match self {
            FixtureNode::Text { text } => Element::text(PropValue::from(text)),
            FixtureNode::Element {
                tag,
                props,
                on,
                children,
            } => {
                let mut element = Element::new(tag.as_str());
                for (name, value) in props {
                    element = element.prop(name.as_str(), PropValue::from(value));
                }
                for (event, handler) in on {
                    element = element.on(event, handlers.handler(handler));
                }
                element.children(
                    children
                        .iter()
                        .map(|child| child.to_element(handlers))
                        .collect::<Vec<_>>(),
                )
            }
        }
    }
}

/// Named handlers that keep their identity across fixture steps and count
/// their invocations.
#[derive(Default)]
pub struct HandlerPool {
    handlers: BTreeMap<String, (EventHandler, Rc<Cell<usize>>)>,
}

impl HandlerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&mut self, name: &str) -> EventHandler {
        let (handler, _) = self.handlers.entry(name.to_string()).or_insert_with(|| {
            let calls = Rc::new(Cell::new(0));
            let counter = Rc::clone(&calls);
            let handler = EventHandler::new(move |_| counter.set(counter.get() + 1));
            (handler, calls)
        });
        handler.clone()
    }

    pub fn calls(&self, name: &str) -> usize {
        self.handlers
            .get(name)
            .map(|(_, calls)| calls.get())
            .unwrap_or(0)
    }
}

pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load the corpus from both mirrors, asserting they agree.
pub fn load_corpus() -> Vec<FixtureCase> {
    let dir = fixture_dir();
    let toml_path = dir.join("corpus.toml");
    let json_path = dir.join("corpus.json");

    let toml_corpus: FixtureCorpus = {
        let content = fs::read_to_string(&toml_path)
            .unwrap_or_else(|err| panic!("failed to read fixture corpus {toml_path:?}: {err}"));
        toml::from_str(&content)
            .unwrap_or_else(|err| panic!("failed to parse fixture corpus {toml_path:?}: {err}"))
    };
    let json_corpus: FixtureCorpus = {
        let content = fs::read_to_string(&json_path)
            .unwrap_or_else(|err| panic!("failed to read fixture corpus {json_path:?}: {err}"));
        serde_json::from_str(&content)
            .unwrap_or_else(|err| panic!("failed to parse fixture corpus {json_path:?}: {err}"))
    };

    validate_corpus(&toml_corpus, &toml_path);
    validate_corpus(&json_corpus, &json_path);
    assert_eq!(
        toml_corpus, json_corpus,
        "fixture corpora diverged: {toml_path:?} vs {json_path:?}"
    );
    toml_corpus.cases
}

fn validate_corpus(corpus: &FixtureCorpus, path: &Path) {
    assert_eq!(
        corpus.format, FIXTURE_FORMAT_V1,
        "unsupported fixture format in {path:?}"
    );
    let mut seen = BTreeSet::new();
    for case in &corpus.cases {
        assert!(!case.id.is_empty(), "empty case id in {path:?}");
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate case id '{}' in {path:?}",
            case.id
        );
        assert!(
            !case.steps.is_empty(),
            "case '{}' has no steps in {path:?}",
            case.id
        );
    }
}
