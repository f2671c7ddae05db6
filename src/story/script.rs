//! Compiled story scripts and the session that plays them.
//!
//! A script is a set of named knots. Each knot emits its lines, then either
//! offers choices or diverts to another knot; a knot with neither ends the
//! story. Selecting a choice echoes its label as the next line (unless the
//! choice sets `echo: false`) and jumps to its `goto` knot.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::{StoryChoice, StoryError, StorySession};

/// Divert chains longer than this are treated as the end of the story.
const MAX_DIVERT_HOPS: usize = 64;

fn default_start() -> String {
    "start".to_string()
}

fn default_echo() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryScript {
    #[serde(default = "default_start")]
    pub start: String,
    pub knots: HashMap<String, ScriptKnot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptKnot {
    #[serde(default)]
    pub lines: Vec<ScriptLine>,
    #[serde(default)]
    pub choices: Vec<ScriptChoice>,
    #[serde(default)]
    pub divert: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptLine {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptChoice {
    pub label: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub goto: Option<String>,
    #[serde(default = "default_echo")]
    pub echo: bool,
}

impl StoryScript {
    /// Checks that the start knot and every divert/goto target exist.
    pub fn validate(&self, name: &str) -> Result<(), StoryError> {
        let missing = |knot: &str| StoryError::UnknownKnot {
            script: name.to_string(),
            knot: knot.to_string(),
        };

        if !self.knots.contains_key(&self.start) {
            return Err(missing(&self.start));
        }
        for knot in self.knots.values() {
            let targets = knot
                .divert
                .iter()
                .chain(knot.choices.iter().filter_map(|c| c.goto.as_ref()));
            for target in targets {
                if !self.knots.contains_key(target) {
                    return Err(missing(target));
                }
            }
        }
        Ok(())
    }
}

/// Plays one `StoryScript` from its start knot.
#[derive(Debug)]
pub struct ScriptSession {
    script: Arc<StoryScript>,
    queued: VecDeque<ScriptLine>,
    choices: Vec<ScriptChoice>,
    current_tags: Vec<String>,
}

impl ScriptSession {
    pub fn new(script: Arc<StoryScript>) -> Self {
        let start = script.start.clone();
        let mut session = Self {
            script,
            queued: VecDeque::new(),
            choices: Vec::new(),
            current_tags: Vec::new(),
        };
        session.enter(&start);
        session
    }

    fn enter(&mut self, knot_name: &str) {
        let script = Arc::clone(&self.script);
        let mut next = Some(knot_name.to_string());
        let mut hops = 0;

        while let Some(name) = next.take() {
            let Some(knot) = script.knots.get(&name) else {
                return;
            };
            self.queued.extend(knot.lines.iter().cloned());
            if !knot.choices.is_empty() {
                self.choices = knot.choices.clone();
                return;
            }
            hops += 1;
            if hops > MAX_DIVERT_HOPS {
                return;
            }
            next = knot.divert.clone();
        }
    }
}

impl StorySession for ScriptSession {
    fn has_more_text(&self) -> bool {
        !self.queued.is_empty()
    }

    fn next_line(&mut self) -> Option<String> {
        let line = self.queued.pop_front()?;
        self.current_tags = line.tags;
        Some(line.text)
    }

    fn pending_choices(&self) -> Vec<StoryChoice> {
        if !self.queued.is_empty() {
            return Vec::new();
        }
        self.choices
            .iter()
            .map(|choice| StoryChoice {
                label: choice.label.clone(),
                tags: choice.tags.clone(),
            })
            .collect()
    }

    fn select_choice(&mut self, index: usize) -> Result<(), StoryError> {
        if index >= self.choices.len() || !self.queued.is_empty() {
            return Err(StoryError::ChoiceOutOfRange {
                index,
                available: self.pending_choices().len(),
            });
        }
        let choice = self.choices.swap_remove(index);
        self.choices.clear();
        if choice.echo {
            self.queued.push_back(ScriptLine {
                text: choice.label.clone(),
                tags: Vec::new(),
            });
        }
        if let Some(goto) = choice.goto {
            self.enter(&goto);
        }
        Ok(())
    }

    fn current_tags(&self) -> &[String] {
        &self.current_tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(source: &str) -> ScriptSession {
        let script: StoryScript = ron::from_str(source).unwrap();
        script.validate("test").unwrap();
        ScriptSession::new(Arc::new(script))
    }

    const BRANCHING: &str = r#"(
        knots: {
            "start": (
                lines: [(text: "Long day?"), (text: "Mine too.", tags: ["mood:tired"])],
                choices: [
                    (label: "Yes", tags: ["reaction:agree"], goto: Some("yes")),
                    (label: "No", tags: ["reaction:disagree"], goto: Some("no"), echo: false),
                ],
            ),
            "yes": (lines: [(text: "Thought so.", tags: ["ending"])]),
            "no": (divert: Some("tail")),
            "tail": (lines: [(text: "Oh well.")]),
        },
    )"#;

    #[test]
    fn test_lines_come_out_one_at_a_time_with_tags() {
        let mut s = session(BRANCHING);
        assert!(s.has_more_text());
        assert_eq!(s.next_line().as_deref(), Some("Long day?"));
        assert!(s.current_tags().is_empty());
        assert!(s.pending_choices().is_empty(), "choices wait for text to drain");
        assert_eq!(s.next_line().as_deref(), Some("Mine too."));
        assert_eq!(s.current_tags(), ["mood:tired".to_string()]);
        assert!(!s.has_more_text());
        assert_eq!(s.pending_choices().len(), 2);
    }

    #[test]
    fn test_select_choice_echoes_label_then_follows_goto() {
        let mut s = session(BRANCHING);
        while s.next_line().is_some() {}
        s.select_choice(0).unwrap();
        assert_eq!(s.next_line().as_deref(), Some("Yes"));
        assert_eq!(s.next_line().as_deref(), Some("Thought so."));
        assert_eq!(s.current_tags(), ["ending".to_string()]);
        assert!(!s.has_more_text());
        assert!(s.pending_choices().is_empty());
    }

    #[test]
    fn test_choice_without_echo_follows_divert_chain() {
        let mut s = session(BRANCHING);
        while s.next_line().is_some() {}
        s.select_choice(1).unwrap();
        assert_eq!(s.next_line().as_deref(), Some("Oh well."));
        assert!(s.next_line().is_none());
    }

    #[test]
    fn test_select_choice_out_of_range() {
        let mut s = session(BRANCHING);
        assert!(s.select_choice(0).is_err(), "text still pending");
        while s.next_line().is_some() {}
        assert!(matches!(
            s.select_choice(5),
            Err(StoryError::ChoiceOutOfRange { index: 5, available: 2 })
        ));
    }

    #[test]
    fn test_divert_cycle_terminates() {
        let mut s = session(
            r#"(knots: { "start": (lines: [(text: "a")], divert: Some("start")) })"#,
        );
        let mut produced = 0;
        while s.next_line().is_some() {
            produced += 1;
        }
        assert_eq!(produced, MAX_DIVERT_HOPS + 1);
    }
}
