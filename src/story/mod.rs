//! Story engine contract.
//!
//! The dialogue player only ever talks to `StoryEngine` / `StorySession`.
//! `StoryLibrary` is the in-crate engine: it plays compiled scripts written
//! in RON (see `script`), keyed by `ScriptHandle`.

mod script;

pub use script::{ScriptChoice, ScriptKnot, ScriptLine, ScriptSession, StoryScript};

use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::shared::ScriptHandle;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("unknown script '{0}'")]
    UnknownScript(String),
    #[error("script '{script}' has no knot named '{knot}'")]
    UnknownKnot { script: String, knot: String },
    #[error("choice {index} is out of range ({available} pending)")]
    ChoiceOutOfRange { index: usize, available: usize },
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// One pending choice as the story presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryChoice {
    pub label: String,
    pub tags: Vec<String>,
}

/// A running script. Lines are produced lazily, one per `next_line` call.
pub trait StorySession: Send + Sync {
    fn has_more_text(&self) -> bool;
    fn next_line(&mut self) -> Option<String>;
    fn pending_choices(&self) -> Vec<StoryChoice>;
    fn select_choice(&mut self, index: usize) -> Result<(), StoryError>;
    /// Tags attached to the line most recently returned by `next_line`.
    fn current_tags(&self) -> &[String];
}

pub trait StoryEngine {
    fn open(&self, script: &ScriptHandle) -> Result<Box<dyn StorySession>, StoryError>;
}

/// Every compiled script known to the game.
#[derive(Resource, Debug, Default)]
pub struct StoryLibrary {
    scripts: HashMap<String, Arc<StoryScript>>,
}

impl StoryLibrary {
    pub fn insert(&mut self, name: impl Into<String>, script: StoryScript) {
        self.scripts.insert(name.into(), Arc::new(script));
    }

    /// Loads a RON map of `name: script` entries. Returns how many were added.
    pub fn load_bundle(&mut self, source: &str) -> Result<usize, StoryError> {
        let bundle: HashMap<String, StoryScript> = ron::from_str(source)?;
        let count = bundle.len();
        for (name, script) in bundle {
            self.insert(name, script);
        }
        Ok(count)
    }

    pub fn contains(&self, script: &ScriptHandle) -> bool {
        self.scripts.contains_key(script.as_str())
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl StoryEngine for StoryLibrary {
    fn open(&self, script: &ScriptHandle) -> Result<Box<dyn StorySession>, StoryError> {
        let compiled = self
            .scripts
            .get(script.as_str())
            .ok_or_else(|| StoryError::UnknownScript(script.to_string()))?;
        compiled.validate(script.as_str())?;
        Ok(Box::new(ScriptSession::new(Arc::clone(compiled))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "hello": (
            knots: {
                "start": (lines: [(text: "Hello.")]),
            },
        ),
        "broken": (
            knots: {
                "start": (divert: Some("nowhere")),
            },
        ),
    }"#;

    #[test]
    fn test_load_bundle_registers_every_script() {
        let mut library = StoryLibrary::default();
        assert_eq!(library.load_bundle(BUNDLE).unwrap(), 2);
        assert!(library.contains(&ScriptHandle::new("hello")));
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_open_unknown_script_fails() {
        let library = StoryLibrary::default();
        assert!(matches!(
            library.open(&ScriptHandle::new("missing")),
            Err(StoryError::UnknownScript(_))
        ));
    }

    #[test]
    fn test_open_rejects_dangling_divert() {
        let mut library = StoryLibrary::default();
        library.load_bundle(BUNDLE).unwrap();
        assert!(matches!(
            library.open(&ScriptHandle::new("broken")),
            Err(StoryError::UnknownKnot { .. })
        ));
        assert!(library.open(&ScriptHandle::new("hello")).is_ok());
    }

    #[test]
    fn test_malformed_bundle_is_a_ron_error() {
        let mut library = StoryLibrary::default();
        assert!(matches!(
            library.load_bundle("{ \"x\": (knots: [) }"),
            Err(StoryError::Ron(_))
        ));
        assert!(library.is_empty());
    }
}
