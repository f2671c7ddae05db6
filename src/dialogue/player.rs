//! The dialogue player: drives one story session at a time, one tick at a
//! time, and hands back a single `DialogueOutcome` when it is done.

use bevy::prelude::*;
use std::time::Duration;

use super::reaction::{merge_tags, resolve_reaction};
use crate::shared::*;
use crate::story::{StoryChoice, StoryEngine, StorySession};

/// Identifies one `play` call. Collect its result with `take_outcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DialogueOutcome {
    pub reaction: Reaction,
    pub tags: Vec<String>,
}

impl DialogueOutcome {
    pub fn neutral() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRejected {
    /// Another session is still running on this player.
    Busy,
}

/// What the presentation surface should show right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueView {
    pub visible: bool,
    pub speaker: Option<String>,
    pub text: String,
    pub revealed_chars: usize,
    /// Labels of the choice buttons currently shown. Empty when no prompt.
    pub choices: Vec<String>,
    pub awaiting_continue: bool,
}

impl DialogueView {
    pub fn visible_text(&self) -> String {
        self.text.chars().take(self.revealed_chars).collect()
    }

    pub fn fully_revealed(&self) -> bool {
        self.revealed_chars >= self.text.chars().count()
    }
}

enum PlaybackStep {
    Pulling,
    Revealing { shown: usize, total: usize, carry: f32 },
    AwaitingContinue,
    AwaitingTick,
    AwaitingChoice { choices: Vec<StoryChoice> },
}

struct ActiveSession {
    ticket: PlaybackTicket,
    script: ScriptHandle,
    story: Box<dyn StorySession>,
    step: PlaybackStep,
    /// Label of the choice just taken; the echoed line is swallowed once.
    echo_label: Option<String>,
    chosen_index: Option<usize>,
    chosen_tags: Vec<String>,
    /// Tags of every line produced since the last choice. A session that
    /// never reaches a choice keeps the tags of all of its lines.
    trailing_tags: Vec<String>,
}

#[derive(Resource)]
pub struct DialoguePlayer {
    settings: DialogueSettings,
    surface_attached: bool,
    session: Option<ActiveSession>,
    view: DialogueView,
    next_ticket: u64,
    completed: Vec<(PlaybackTicket, DialogueOutcome)>,
    continue_requested: bool,
}

impl FromWorld for DialoguePlayer {
    fn from_world(world: &mut World) -> Self {
        let settings = world
            .get_resource::<ShopConfig>()
            .map(|config| config.dialogue.clone())
            .unwrap_or_default();
        Self::new(settings)
    }
}

impl DialoguePlayer {
    pub fn new(settings: DialogueSettings) -> Self {
        Self {
            settings,
            surface_attached: false,
            session: None,
            view: DialogueView::default(),
            next_ticket: 0,
            completed: Vec::new(),
            continue_requested: false,
        }
    }

    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    /// Takes effect from the next line onward.
    pub fn set_settings(&mut self, settings: DialogueSettings) {
        self.settings = settings;
    }

    /// Called by whatever renders `view()`. Without a surface every `play`
    /// resolves neutral immediately.
    pub fn attach_surface(&mut self) {
        self.surface_attached = true;
    }

    pub fn detach_surface(&mut self) {
        self.surface_attached = false;
    }

    pub fn has_surface(&self) -> bool {
        self.surface_attached
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    pub fn view(&self) -> &DialogueView {
        &self.view
    }

    /// Starts playing `script`. Failures to open the script, a missing
    /// script, or a missing surface all resolve to a neutral outcome that is
    /// ready on the next `take_outcome`.
    pub fn play(
        &mut self,
        script: Option<&ScriptHandle>,
        speaker: Option<&str>,
        engine: &dyn StoryEngine,
    ) -> Result<PlaybackTicket, PlayRejected> {
        if let Some(active) = &self.session {
            warn!(
                "[Dialogue] Rejected play of {:?}: '{}' is still playing",
                script.map(ScriptHandle::as_str),
                active.script
            );
            return Err(PlayRejected::Busy);
        }

        let ticket = PlaybackTicket(self.next_ticket);
        self.next_ticket += 1;

        let Some(script) = script else {
            debug!("[Dialogue] No script given; resolving neutral");
            self.completed.push((ticket, DialogueOutcome::neutral()));
            return Ok(ticket);
        };

        if !self.surface_attached {
            warn!("[Dialogue] No dialogue surface attached; skipping '{}'", script);
            self.completed.push((ticket, DialogueOutcome::neutral()));
            return Ok(ticket);
        }

        let story = match engine.open(script) {
            Ok(story) => story,
            Err(err) => {
                warn!("[Dialogue] Could not open '{}': {}", script, err);
                self.completed.push((ticket, DialogueOutcome::neutral()));
                return Ok(ticket);
            }
        };

        info!("[Dialogue] Playing '{}'", script);
        self.view = DialogueView {
            visible: true,
            speaker: speaker.map(str::to_string),
            ..default()
        };
        self.continue_requested = false;
        self.session = Some(ActiveSession {
            ticket,
            script: script.clone(),
            story,
            step: PlaybackStep::Pulling,
            echo_label: None,
            chosen_index: None,
            chosen_tags: Vec::new(),
            trailing_tags: Vec::new(),
        });
        Ok(ticket)
    }

    pub fn take_outcome(&mut self, ticket: PlaybackTicket) -> Option<DialogueOutcome> {
        let position = self.completed.iter().position(|(t, _)| *t == ticket)?;
        Some(self.completed.swap_remove(position).1)
    }

    /// A continue press: finishes a typewriter reveal, or moves past a line
    /// that is waiting for the player.
    pub fn press_continue(&mut self) {
        if let Some(session) = &self.session {
            if matches!(
                session.step,
                PlaybackStep::Revealing { .. } | PlaybackStep::AwaitingContinue
            ) {
                self.continue_requested = true;
            }
        }
    }

    /// Selects a shown choice. All buttons are hidden before the story hears
    /// about it, so a second call for the same prompt returns `false`.
    pub fn choose(&mut self, index: usize) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let PlaybackStep::AwaitingChoice { choices } = &session.step else {
            debug!("[Dialogue] Choice {} ignored: no prompt open", index);
            return false;
        };
        if index >= self.view.choices.len() {
            warn!(
                "[Dialogue] Choice {} ignored: only {} shown",
                index,
                self.view.choices.len()
            );
            return false;
        }
        let choice = choices[index].clone();

        self.view.choices.clear();
        session.step = PlaybackStep::Pulling;

        match session.story.select_choice(index) {
            Ok(()) => {
                debug!("[Dialogue] Chose '{}'", choice.label);
                session.echo_label = Some(choice.label);
                session.chosen_index = Some(index);
                session.chosen_tags = choice.tags;
                session.trailing_tags.clear();
            }
            Err(err) => {
                warn!("[Dialogue] '{}' rejected choice {}: {}", session.script, index, err);
                self.finish();
            }
        }
        true
    }

    /// One tick of playback.
    pub fn advance(&mut self, dt: Duration) {
        let continue_pressed = std::mem::take(&mut self.continue_requested);
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let next = match &mut session.step {
            PlaybackStep::Pulling | PlaybackStep::AwaitingTick => Some(PlaybackStep::Pulling),
            PlaybackStep::AwaitingContinue => continue_pressed.then_some(PlaybackStep::Pulling),
            PlaybackStep::AwaitingChoice { .. } => None,
            PlaybackStep::Revealing { shown, total, carry } => {
                if continue_pressed {
                    *shown = *total;
                } else if let Some(cps) = self.settings.chars_per_sec {
                    *carry += cps * dt.as_secs_f32();
                    let whole = carry.floor();
                    *carry -= whole;
                    *shown = shown.saturating_add(whole as usize).min(*total);
                } else {
                    *shown = *total;
                }
                self.view.revealed_chars = *shown;
                if *shown >= *total {
                    self.view.awaiting_continue = self.settings.manual_advance;
                    Some(gate_after_line(self.settings.manual_advance))
                } else {
                    None
                }
            }
        };

        if let Some(step) = next {
            let pull = matches!(step, PlaybackStep::Pulling);
            session.step = step;
            if pull {
                self.pull();
            }
        }
    }

    fn pull(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        loop {
            if session.story.has_more_text() {
                let line = session.story.next_line().unwrap_or_default();
                for tag in session.story.current_tags() {
                    session.trailing_tags.push(tag.clone());
                }

                let echo = session.echo_label.take();
                if echo.as_deref().map(str::trim) == Some(line.trim()) {
                    continue;
                }
                if line.trim().is_empty() {
                    continue;
                }

                let total = line.chars().count();
                self.view.text = line;
                self.view.choices.clear();
                match self.settings.chars_per_sec {
                    Some(cps) if cps > 0.0 && cps.is_finite() => {
                        self.view.revealed_chars = 0;
                        self.view.awaiting_continue = false;
                        session.step = PlaybackStep::Revealing {
                            shown: 0,
                            total,
                            carry: 0.0,
                        };
                    }
                    _ => {
                        self.view.revealed_chars = total;
                        self.view.awaiting_continue = self.settings.manual_advance;
                        session.step = gate_after_line(self.settings.manual_advance);
                    }
                }
                return;
            }

            let choices = session.story.pending_choices();
            if choices.is_empty() {
                break;
            }

            let shown = self.settings.max_choice_buttons.min(choices.len());
            if shown == 0 {
                warn!(
                    "[Dialogue] '{}' offers {} choices but no buttons are configured",
                    session.script,
                    choices.len()
                );
                break;
            }
            if choices.len() > shown {
                debug!(
                    "[Dialogue] Hiding {} surplus choices in '{}'",
                    choices.len() - shown,
                    session.script
                );
            }
            self.view.choices = choices[..shown].iter().map(|c| c.label.clone()).collect();
            self.view.awaiting_continue = false;
            session.step = PlaybackStep::AwaitingChoice { choices };
            return;
        }

        self.finish();
    }

    fn finish(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let tags = merge_tags(&session.chosen_tags, &session.trailing_tags);
        let reaction = resolve_reaction(self.settings.policy, session.chosen_index, &tags);
        info!(
            "[Dialogue] '{}' finished: {:?} {:?}",
            session.script, reaction, tags
        );
        self.view = DialogueView::default();
        self.continue_requested = false;
        self.completed
            .push((session.ticket, DialogueOutcome { reaction, tags }));
    }
}

fn gate_after_line(manual_advance: bool) -> PlaybackStep {
    if manual_advance {
        PlaybackStep::AwaitingContinue
    } else {
        PlaybackStep::AwaitingTick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::StoryLibrary;

    const TICK: Duration = Duration::from_millis(100);

    const SCRIPTS: &str = r#"{
        "small_talk": (
            knots: {
                "start": (
                    lines: [(text: "Rough week.")],
                    choices: [
                        (label: "Yes", goto: Some("after")),
                        (label: "Meh", goto: Some("after")),
                        (label: "No", goto: Some("after")),
                    ],
                ),
                "after": (lines: [(text: "Anyway.", tags: ["mood:tired"])]),
            },
        ),
        "tagged": (
            knots: {
                "start": (
                    lines: [(text: "Should I quit?")],
                    choices: [(label: "Go for it", tags: ["reaction:agree"])],
                ),
            },
        ),
        "merge": (
            knots: {
                "start": (
                    lines: [(text: "Hm.", tags: ["early"])],
                    choices: [(label: "Sure", tags: ["reaction:agree", "warm"], goto: Some("end"))],
                ),
                "end": (lines: [
                    (text: "Nice.", tags: ["warm", "tip:5"]),
                    (text: "Bye.", tags: ["ending"]),
                ]),
            },
        ),
        "many_choices": (
            knots: {
                "start": (
                    lines: [(text: "Pick.")],
                    choices: [(label: "a"), (label: "b"), (label: "c"), (label: "d"), (label: "e")],
                ),
            },
        ),
        "monologue": (
            knots: {
                "start": (lines: [(text: "One."), (text: "Two."), (text: "Three.")]),
            },
        ),
        "dangling": (knots: { "start": (divert: Some("gone")) }),
        "tagged_monologue": (
            knots: {
                "start": (lines: [
                    (text: "Long day.", tags: ["tired"]),
                    (text: "But you listened.", tags: ["reaction:agree", "tip:2"]),
                ]),
            },
        ),
    }"#;

    fn library() -> StoryLibrary {
        let mut library = StoryLibrary::default();
        library.load_bundle(SCRIPTS).unwrap();
        library
    }

    fn instant(policy: ReactionPolicy) -> DialoguePlayer {
        let mut player = DialoguePlayer::new(DialogueSettings {
            chars_per_sec: None,
            manual_advance: false,
            max_choice_buttons: 3,
            policy,
        });
        player.attach_surface();
        player
    }

    fn run_until_choice(player: &mut DialoguePlayer) {
        for _ in 0..50 {
            if !player.view().choices.is_empty() || !player.is_playing() {
                return;
            }
            player.advance(TICK);
        }
        panic!("no prompt appeared");
    }

    fn run_to_end(player: &mut DialoguePlayer) {
        for _ in 0..50 {
            if !player.is_playing() {
                return;
            }
            player.advance(TICK);
        }
        panic!("session never finished");
    }

    #[test]
    fn test_play_none_resolves_neutral_without_ui() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        let ticket = player.play(None, None, &lib).unwrap();
        assert!(!player.is_playing());
        assert!(!player.view().visible);
        assert_eq!(player.take_outcome(ticket), Some(DialogueOutcome::neutral()));
        assert_eq!(player.take_outcome(ticket), None, "outcomes are taken once");
    }

    #[test]
    fn test_unopenable_scripts_resolve_neutral() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        for name in ["missing", "dangling"] {
            let ticket = player.play(Some(&ScriptHandle::new(name)), None, &lib).unwrap();
            assert!(!player.is_playing());
            assert_eq!(player.take_outcome(ticket), Some(DialogueOutcome::neutral()));
        }
    }

    #[test]
    fn test_without_surface_resolves_neutral() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        player.detach_surface();
        let ticket = player
            .play(Some(&ScriptHandle::new("small_talk")), None, &lib)
            .unwrap();
        assert!(!player.is_playing());
        assert_eq!(player.take_outcome(ticket), Some(DialogueOutcome::neutral()));
    }

    #[test]
    fn test_second_play_is_rejected_while_busy() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        player.play(Some(&ScriptHandle::new("monologue")), None, &lib).unwrap();
        assert_eq!(
            player.play(Some(&ScriptHandle::new("tagged")), None, &lib),
            Err(PlayRejected::Busy)
        );
    }

    #[test]
    fn test_positional_policy_third_choice_disagrees() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Positional);
        let ticket = player
            .play(Some(&ScriptHandle::new("small_talk")), Some("Ayu"), &lib)
            .unwrap();
        run_until_choice(&mut player);
        assert_eq!(player.view().choices, vec!["Yes", "Meh", "No"]);
        assert!(player.choose(2));
        run_to_end(&mut player);
        let outcome = player.take_outcome(ticket).unwrap();
        assert_eq!(outcome.reaction, Reaction::Disagree);
        assert_eq!(outcome.tags, vec!["mood:tired".to_string()]);
    }

    #[test]
    fn test_positional_policy_no_choice_tags_is_empty() {
        let mut player = instant(ReactionPolicy::Positional);
        let mut script = crate::story::StoryScript {
            start: "start".into(),
            knots: Default::default(),
        };
        script.knots.insert(
            "start".into(),
            crate::story::ScriptKnot {
                lines: vec![],
                choices: ["Yes", "Meh", "No"]
                    .iter()
                    .map(|label| crate::story::ScriptChoice {
                        label: label.to_string(),
                        tags: vec![],
                        goto: None,
                        echo: true,
                    })
                    .collect(),
                divert: None,
            },
        );
        let mut lib = StoryLibrary::default();
        lib.insert("bare", script);
        let ticket = player.play(Some(&ScriptHandle::new("bare")), None, &lib).unwrap();
        run_until_choice(&mut player);
        assert!(player.choose(2));
        run_to_end(&mut player);
        assert_eq!(
            player.take_outcome(ticket),
            Some(DialogueOutcome { reaction: Reaction::Disagree, tags: vec![] })
        );
    }

    #[test]
    fn test_tagged_policy_sole_choice_agrees() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        let ticket = player.play(Some(&ScriptHandle::new("tagged")), None, &lib).unwrap();
        run_until_choice(&mut player);
        assert!(player.choose(0));
        run_to_end(&mut player);
        assert_eq!(
            player.take_outcome(ticket),
            Some(DialogueOutcome {
                reaction: Reaction::Agree,
                tags: vec!["reaction:agree".to_string()],
            })
        );
    }

    #[test]
    fn test_choice_can_only_be_taken_once() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Positional);
        let ticket = player
            .play(Some(&ScriptHandle::new("small_talk")), None, &lib)
            .unwrap();
        run_until_choice(&mut player);
        assert!(player.choose(0));
        assert!(player.view().choices.is_empty(), "buttons hide with the first pick");
        assert!(!player.choose(1));
        assert!(!player.choose(2));
        run_to_end(&mut player);
        assert_eq!(player.take_outcome(ticket).unwrap().reaction, Reaction::Agree);
    }

    #[test]
    fn test_echoed_choice_label_is_suppressed_once() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        player
            .play(Some(&ScriptHandle::new("small_talk")), None, &lib)
            .unwrap();
        run_until_choice(&mut player);
        player.choose(0);
        player.advance(TICK);
        assert_eq!(player.view().text, "Anyway.", "the 'Yes' echo never shows");
    }

    #[test]
    fn test_merged_tags_put_choice_tags_first() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        let ticket = player.play(Some(&ScriptHandle::new("merge")), None, &lib).unwrap();
        run_until_choice(&mut player);
        player.choose(0);
        run_to_end(&mut player);
        let outcome = player.take_outcome(ticket).unwrap();
        assert_eq!(
            outcome.tags,
            vec!["reaction:agree", "warm", "tip:5", "ending"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
        assert_eq!(outcome.reaction, Reaction::Agree);
    }

    #[test]
    fn test_surplus_choices_are_hidden() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Positional);
        player
            .play(Some(&ScriptHandle::new("many_choices")), None, &lib)
            .unwrap();
        run_until_choice(&mut player);
        assert_eq!(player.view().choices, vec!["a", "b", "c"]);
        assert!(!player.choose(3), "hidden choices cannot be picked");
        assert!(player.choose(1));
    }

    #[test]
    fn test_auto_advance_shows_one_line_per_tick() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        player
            .play(Some(&ScriptHandle::new("monologue")), None, &lib)
            .unwrap();
        let mut seen = Vec::new();
        while player.is_playing() {
            player.advance(TICK);
            if player.view().visible {
                seen.push(player.view().text.clone());
            }
        }
        assert_eq!(seen, vec!["One.", "Two.", "Three."]);
    }

    #[test]
    fn test_manual_advance_waits_for_continue() {
        let lib = library();
        let mut player = DialoguePlayer::new(DialogueSettings {
            chars_per_sec: None,
            manual_advance: true,
            max_choice_buttons: 3,
            policy: ReactionPolicy::Tagged,
        });
        player.attach_surface();
        player
            .play(Some(&ScriptHandle::new("monologue")), None, &lib)
            .unwrap();
        player.advance(TICK);
        assert_eq!(player.view().text, "One.");
        assert!(player.view().awaiting_continue);
        for _ in 0..10 {
            player.advance(TICK);
        }
        assert_eq!(player.view().text, "One.", "no press, no progress");
        player.press_continue();
        player.advance(TICK);
        assert_eq!(player.view().text, "Two.");
    }

    #[test]
    fn test_typewriter_reveals_over_time_and_continue_completes_it() {
        let lib = library();
        let mut player = DialoguePlayer::new(DialogueSettings {
            chars_per_sec: Some(10.0),
            manual_advance: true,
            max_choice_buttons: 3,
            policy: ReactionPolicy::Tagged,
        });
        player.attach_surface();
        player
            .play(Some(&ScriptHandle::new("small_talk")), None, &lib)
            .unwrap();
        player.advance(TICK);
        assert_eq!(player.view().text, "Rough week.");
        assert_eq!(player.view().revealed_chars, 0);
        player.advance(Duration::from_millis(300));
        assert_eq!(player.view().visible_text(), "Rou");
        player.press_continue();
        player.advance(TICK);
        assert!(player.view().fully_revealed());
        assert!(player.view().awaiting_continue);
        player.press_continue();
        player.advance(TICK);
        assert_eq!(player.view().choices.len(), 3);
    }

    #[test]
    fn test_choiceless_session_keeps_tags_of_every_line() {
        let lib = library();
        let mut player = instant(ReactionPolicy::Tagged);
        let ticket = player
            .play(Some(&ScriptHandle::new("tagged_monologue")), None, &lib)
            .unwrap();
        run_to_end(&mut player);
        let outcome = player.take_outcome(ticket).unwrap();
        assert_eq!(outcome.reaction, Reaction::Agree);
        assert_eq!(
            outcome.tags,
            vec!["tired".to_string(), "reaction:agree".to_string(), "tip:2".to_string()]
        );
    }

    #[test]
    fn test_unbounded_typewriter_speed_shows_whole_line() {
        let lib = library();
        for cps in [f32::INFINITY, f32::MAX] {
            let mut player = DialoguePlayer::new(DialogueSettings {
                chars_per_sec: Some(cps),
                manual_advance: true,
                max_choice_buttons: 3,
                policy: ReactionPolicy::Tagged,
            });
            player.attach_surface();
            player
                .play(Some(&ScriptHandle::new("monologue")), None, &lib)
                .unwrap();
            player.advance(TICK);
            player.advance(TICK);
            assert_eq!(player.view().text, "One.");
            assert!(player.view().fully_revealed());
            assert!(player.view().awaiting_continue);
        }
    }

    #[test]
    fn test_init_resource_reads_dialogue_settings_from_config() {
        let mut world = World::new();
        let mut config = ShopConfig::default();
        config.dialogue.max_choice_buttons = 2;
        config.dialogue.policy = ReactionPolicy::Positional;
        world.insert_resource(config.clone());
        world.init_resource::<DialoguePlayer>();
        assert_eq!(*world.resource::<DialoguePlayer>().settings(), config.dialogue);
    }
}
