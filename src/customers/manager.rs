//! The customer orchestrator: one customer at a time, one day at a time.
//!
//! `CustomerManager` is a plain state machine. Systems feed it serve events
//! and frame time; it answers with `ShopEffect`s that the plugin turns into
//! entities and events. Dialogue runs on the shared `DialoguePlayer` and is
//! polled by ticket, so every wait here is a phase resumed on a later tick.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

use super::customer::Customer;
use super::schedule::DaySchedule;
use crate::dialogue::{DialogueOutcome, DialoguePlayer, PlayRejected, PlaybackTicket};
use crate::shared::*;
use crate::story::StoryEngine;

/// Publicly observable orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerState {
    Idle,
    Ordering,
    WaitingForServe,
    ShowingMessage,
    WaitingBetweenCustomers,
    DayEnding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterMessage {
    PlayCurhat,
    RetryServe,
    Leave,
}

#[derive(Debug)]
enum CustomerPhase {
    Idle,
    Ordering(PlaybackTicket),
    WaitingForServe,
    ShowingMessage { timer: Timer, then: AfterMessage },
    /// Curhat after a correct serve. Reported as `ShowingMessage`.
    Listening(PlaybackTicket),
    WaitingBetweenCustomers(Timer),
    DayEnding(Timer),
}

/// Something the rest of the app should hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum ShopEffect {
    DayStarted {
        day: u32,
        customers: usize,
    },
    DayEnded {
        day: u32,
    },
    CustomerArrived {
        profile_id: String,
        name: String,
        portrait: Option<String>,
        requested_item: ItemId,
    },
    Speech {
        speaker: String,
        text: String,
        secs: f32,
    },
    CustomerLeft {
        profile_id: String,
        name: String,
        served: bool,
    },
    Reacted {
        profile_id: String,
        name: String,
        reaction: Reaction,
        tags: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeIgnored {
    /// The orchestrator is not waiting for a serve.
    NotWaiting,
    /// A serve was already handled this tick.
    Locked,
    NoCustomer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    Ignored(ServeIgnored),
    Served,
    WrongItem { fail_count: u32, max_fails: u32 },
    Leaving,
}

/// Everything a tick needs besides the manager itself.
pub struct ShopContext<'a> {
    pub config: &'a ShopConfig,
    pub profiles: &'a ProfileStore,
    pub catalog: &'a ItemCatalog,
    pub stories: &'a dyn StoryEngine,
    pub dialogue: &'a mut DialoguePlayer,
}

enum Wake {
    Nothing,
    Spawn,
    OrderTaken,
    MessageDone(AfterMessage),
    CurhatDone(DialogueOutcome),
    BreakOver,
    NewDay,
}

#[derive(Resource, Debug)]
pub struct CustomerManager {
    phase: CustomerPhase,
    day: u32,
    schedule: DaySchedule,
    customer: Option<Customer>,
    /// The order script shown to the current customer; curhat falls back to it.
    order_script: Option<ScriptHandle>,
    serve_locked: bool,
    spawn_pending: bool,
    effects: Vec<ShopEffect>,
}

impl Default for CustomerManager {
    fn default() -> Self {
        Self {
            phase: CustomerPhase::Idle,
            day: 0,
            schedule: DaySchedule::default(),
            customer: None,
            order_script: None,
            serve_locked: false,
            spawn_pending: false,
            effects: Vec::new(),
        }
    }
}

impl CustomerManager {
    pub fn state(&self) -> CustomerState {
        match self.phase {
            CustomerPhase::Idle => CustomerState::Idle,
            CustomerPhase::Ordering(_) => CustomerState::Ordering,
            CustomerPhase::WaitingForServe => CustomerState::WaitingForServe,
            CustomerPhase::ShowingMessage { .. } | CustomerPhase::Listening(_) => {
                CustomerState::ShowingMessage
            }
            CustomerPhase::WaitingBetweenCustomers(_) => CustomerState::WaitingBetweenCustomers,
            CustomerPhase::DayEnding(_) => CustomerState::DayEnding,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn schedule(&self) -> &DaySchedule {
        &self.schedule
    }

    pub fn current_customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn current_requested_item(&self) -> Option<&str> {
        self.customer.as_ref().map(|c| c.requested_item.as_str())
    }

    pub fn current_fail_count(&self) -> u32 {
        self.customer.as_ref().map_or(0, |c| c.fail_count)
    }

    pub fn drain_effects(&mut self) -> Vec<ShopEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Opens the serve window for a new tick.
    pub fn begin_tick(&mut self) {
        self.serve_locked = false;
    }

    /// Validates one served item against the current request.
    pub fn handle_serve(&mut self, item: &str, config: &ShopConfig) -> ServeOutcome {
        if self.serve_locked {
            debug!("[Customers] Serve of '{}' ignored: already served this tick", item);
            return ServeOutcome::Ignored(ServeIgnored::Locked);
        }
        if !matches!(self.phase, CustomerPhase::WaitingForServe) {
            debug!(
                "[Customers] Serve of '{}' ignored in state {:?}",
                item,
                self.state()
            );
            return ServeOutcome::Ignored(ServeIgnored::NotWaiting);
        }
        let Some(customer) = self.customer.as_mut() else {
            warn!("[Customers] Serve of '{}' ignored: nobody at the counter", item);
            return ServeOutcome::Ignored(ServeIgnored::NoCustomer);
        };
        self.serve_locked = true;

        if customer.accepts(item) {
            info!("[Customers] {} got their '{}'", customer.name, customer.requested_item);
            let speaker = customer.name.clone();
            self.say(speaker, config.thanks_text.clone(), config.thanks_secs);
            self.show_message(config.thanks_secs, AfterMessage::PlayCurhat);
            return ServeOutcome::Served;
        }

        let gave_up = customer.record_wrong_serve();
        let (fail_count, max_fails) = (customer.fail_count, customer.max_fails);
        let speaker = customer.name.clone();
        info!(
            "[Customers] {} wanted '{}', got '{}' ({}/{})",
            speaker, customer.requested_item, item, fail_count, max_fails
        );
        if gave_up {
            self.say(speaker, config.leaving_text.clone(), config.leaving_secs);
            self.show_message(config.leaving_secs, AfterMessage::Leave);
            ServeOutcome::Leaving
        } else {
            self.say(speaker, config.wrong_item_text.clone(), config.wrong_item_secs);
            self.show_message(config.wrong_item_secs, AfterMessage::RetryServe);
            ServeOutcome::WrongItem {
                fail_count,
                max_fails,
            }
        }
    }

    /// Advances timers and collects finished dialogue.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: Duration, ctx: &mut ShopContext, rng: &mut R) {
        let wake = match &mut self.phase {
            CustomerPhase::Idle => {
                if std::mem::take(&mut self.spawn_pending) {
                    Wake::Spawn
                } else {
                    Wake::Nothing
                }
            }
            CustomerPhase::Ordering(ticket) => match ctx.dialogue.take_outcome(*ticket) {
                Some(_) => Wake::OrderTaken,
                None => Wake::Nothing,
            },
            CustomerPhase::WaitingForServe => Wake::Nothing,
            CustomerPhase::ShowingMessage { timer, then } => {
                timer.tick(dt);
                if timer.finished() {
                    Wake::MessageDone(*then)
                } else {
                    Wake::Nothing
                }
            }
            CustomerPhase::Listening(ticket) => ctx
                .dialogue
                .take_outcome(*ticket)
                .map_or(Wake::Nothing, Wake::CurhatDone),
            CustomerPhase::WaitingBetweenCustomers(timer) => {
                timer.tick(dt);
                if timer.finished() {
                    Wake::BreakOver
                } else {
                    Wake::Nothing
                }
            }
            CustomerPhase::DayEnding(timer) => {
                timer.tick(dt);
                if timer.finished() {
                    Wake::NewDay
                } else {
                    Wake::Nothing
                }
            }
        };

        match wake {
            Wake::Nothing => {}
            Wake::Spawn => self.spawn_next(ctx, rng),
            Wake::OrderTaken => {
                debug!("[Customers] Order taken; waiting for serve");
                self.phase = CustomerPhase::WaitingForServe;
            }
            Wake::MessageDone(AfterMessage::PlayCurhat) => self.start_curhat(ctx, rng),
            Wake::MessageDone(AfterMessage::RetryServe) => {
                self.phase = CustomerPhase::WaitingForServe;
            }
            Wake::MessageDone(AfterMessage::Leave) => self.depart(ctx.config, false),
            Wake::CurhatDone(outcome) => {
                self.handle_reaction(outcome);
                self.depart(ctx.config, true);
            }
            Wake::BreakOver => {
                self.phase = CustomerPhase::Idle;
                self.spawn_next(ctx, rng);
            }
            Wake::NewDay => {
                self.phase = CustomerPhase::Idle;
                self.start_day(ctx, rng);
            }
        }
    }

    /// Builds today's roster and brings in the first customer.
    pub fn start_day<R: Rng + ?Sized>(&mut self, ctx: &mut ShopContext, rng: &mut R) -> bool {
        let resting = matches!(
            self.phase,
            CustomerPhase::Idle
                | CustomerPhase::WaitingBetweenCustomers(_)
                | CustomerPhase::DayEnding(_)
        );
        if self.customer.is_some() || !resting {
            warn!(
                "[Customers] Start of day ignored in state {:?}",
                self.state()
            );
            return false;
        }
        if ctx.profiles.is_empty() {
            warn!("[Customers] No customer profiles loaded; cannot start a day");
            self.phase = CustomerPhase::Idle;
            return false;
        }

        self.day += 1;
        self.schedule = DaySchedule::build(
            self.day,
            ctx.profiles.len(),
            ctx.config.min_customers_per_day,
            ctx.config.max_customers_per_day,
            rng,
        );
        let customers = self.schedule.roster().len();
        info!("[Customers] Day {} opens with {} customers", self.day, customers);
        self.effects.push(ShopEffect::DayStarted {
            day: self.day,
            customers,
        });

        self.spawn_pending = false;
        self.phase = CustomerPhase::Idle;
        self.spawn_next(ctx, rng);
        true
    }

    /// Brings in the next roster profile, or closes the day when none is left.
    /// Outside `Idle` the spawn waits for the next idle tick.
    pub fn spawn_next<R: Rng + ?Sized>(&mut self, ctx: &mut ShopContext, rng: &mut R) {
        if !matches!(self.phase, CustomerPhase::Idle) {
            debug!("[Customers] Spawn deferred: state is {:?}", self.state());
            self.spawn_pending = true;
            return;
        }
        self.spawn_pending = false;

        let profiles = ctx.profiles;
        loop {
            let Some(index) = self.schedule.next_profile() else {
                self.end_day(ctx.config);
                return;
            };
            let Some(profile) = profiles.get(index) else {
                warn!("[Customers] Roster entry {} has no profile; skipping", index);
                continue;
            };
            if profile.preferred_items.is_empty() {
                warn!(
                    "[Customers] Profile '{}' has no preferred items; skipping",
                    profile.id
                );
                continue;
            }
            let item_index = rng.gen_range(0..profile.preferred_items.len());
            let requested = ctx.catalog.resolve(&profile.preferred_items[item_index], rng);
            self.begin_order(ctx, index, profile, item_index, requested);
            return;
        }
    }

    /// Sends the current customer away unserved, or calls the next one in.
    /// Refused while a dialogue is on screen, after a correct serve, and
    /// while the day is closing.
    pub fn advance_to_next_customer<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut ShopContext,
        rng: &mut R,
    ) -> bool {
        if ctx.dialogue.is_playing()
            || matches!(
                self.phase,
                CustomerPhase::Ordering(_) | CustomerPhase::Listening(_)
            )
        {
            warn!("[Customers] Advance ignored: dialogue in progress");
            return false;
        }
        if matches!(
            self.phase,
            CustomerPhase::ShowingMessage {
                then: AfterMessage::PlayCurhat,
                ..
            }
        ) {
            warn!("[Customers] Advance ignored: customer already served");
            return false;
        }
        if self.day == 0 {
            return self.start_day(ctx, rng);
        }
        if matches!(self.phase, CustomerPhase::DayEnding(_)) && self.customer.is_none() {
            warn!("[Customers] Advance ignored: day {} is closing", self.day);
            return false;
        }
        if let Some(customer) = &self.customer {
            info!("[Customers] {} is sent away", customer.name);
            self.depart(ctx.config, false);
            return true;
        }
        if matches!(self.phase, CustomerPhase::WaitingBetweenCustomers(_)) {
            self.phase = CustomerPhase::Idle;
        }
        self.spawn_next(ctx, rng);
        true
    }

    fn begin_order(
        &mut self,
        ctx: &mut ShopContext,
        profile_index: usize,
        profile: &CustomerProfile,
        item_index: usize,
        requested: ItemId,
    ) {
        let customer = Customer::from_profile(profile_index, profile, item_index, requested);
        info!(
            "[Customers] {} arrives wanting '{}' ({} left today)",
            customer.name,
            customer.requested_item,
            self.schedule.remaining()
        );
        self.effects.push(ShopEffect::CustomerArrived {
            profile_id: customer.profile_id.clone(),
            name: customer.name.clone(),
            portrait: profile.portrait.clone(),
            requested_item: customer.requested_item.clone(),
        });

        let script = profile.order_script(item_index).cloned();
        self.order_script = script.clone();
        let speaker = customer.name.clone();
        let item_name = ctx.catalog.display_name(&customer.requested_item);
        self.customer = Some(customer);

        if let Some(script) = script {
            match ctx.dialogue.play(Some(&script), Some(&speaker), ctx.stories) {
                Ok(ticket) => {
                    self.phase = CustomerPhase::Ordering(ticket);
                    return;
                }
                Err(PlayRejected::Busy) => {
                    warn!("[Customers] Dialogue busy; {} orders without a script", speaker);
                }
            }
        }

        let line = ctx.config.placeholder_order(&item_name);
        self.say(speaker, line, ctx.config.order_text_secs);
        self.phase = CustomerPhase::WaitingForServe;
    }

    fn start_curhat<R: Rng + ?Sized>(&mut self, ctx: &mut ShopContext, rng: &mut R) {
        let Some(customer) = &self.customer else {
            warn!("[Customers] Curhat with nobody at the counter");
            self.depart(ctx.config, true);
            return;
        };
        let script = ctx
            .profiles
            .get(customer.profile_index)
            .and_then(|profile| profile.curhat_scripts.choose(rng))
            .cloned()
            .or_else(|| self.order_script.clone());
        let speaker = customer.name.clone();

        match ctx.dialogue.play(script.as_ref(), Some(&speaker), ctx.stories) {
            Ok(ticket) => self.phase = CustomerPhase::Listening(ticket),
            Err(PlayRejected::Busy) => {
                warn!("[Customers] Dialogue busy; skipping curhat for {}", speaker);
                self.handle_reaction(DialogueOutcome::neutral());
                self.depart(ctx.config, true);
            }
        }
    }

    fn handle_reaction(&mut self, outcome: DialogueOutcome) {
        let Some(customer) = &self.customer else {
            return;
        };
        info!(
            "[Customers] {} reacted {:?} {:?}",
            customer.name, outcome.reaction, outcome.tags
        );
        self.effects.push(ShopEffect::Reacted {
            profile_id: customer.profile_id.clone(),
            name: customer.name.clone(),
            reaction: outcome.reaction,
            tags: outcome.tags,
        });
    }

    fn depart(&mut self, config: &ShopConfig, served: bool) {
        if let Some(customer) = self.customer.take() {
            debug!("[Customers] {} leaves (served: {})", customer.name, served);
            self.effects.push(ShopEffect::CustomerLeft {
                profile_id: customer.profile_id,
                name: customer.name,
                served,
            });
        }
        self.order_script = None;
        self.phase = CustomerPhase::WaitingBetweenCustomers(once(config.between_customers_secs));
    }

    fn end_day(&mut self, config: &ShopConfig) {
        info!("[Customers] Day {} is over", self.day);
        self.effects.push(ShopEffect::DayEnded { day: self.day });
        self.phase = CustomerPhase::DayEnding(once(config.day_end_secs));
    }

    fn show_message(&mut self, secs: f32, then: AfterMessage) {
        self.phase = CustomerPhase::ShowingMessage {
            timer: once(secs),
            then,
        };
    }

    fn say(&mut self, speaker: String, text: String, secs: f32) {
        self.effects.push(ShopEffect::Speech {
            speaker,
            text,
            secs,
        });
    }
}

fn once(secs: f32) -> Timer {
    Timer::from_seconds(secs.max(0.0), TimerMode::Once)
}
