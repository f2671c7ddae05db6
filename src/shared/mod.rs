//! Shared components, resources, events, and states for Kedai.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly, except through the
//! public types re-exported by `story` and `dialogue`.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
}

/// Frame ordering for the shop core. Chained in this order every `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShopSet {
    /// Hardware input and UI clicks become `ShopInput` / events.
    Input,
    /// The dialogue player advances one tick.
    Dialogue,
    /// Inbound serve events are validated.
    Serve,
    /// The customer state machine ticks.
    Orchestrate,
    /// Orchestrator effects become entities and events.
    Effects,
    /// Score / HP bookkeeping.
    Scoring,
}

// ═══════════════════════════════════════════════════════════════════════
// ITEMS
// ═══════════════════════════════════════════════════════════════════════

pub type ItemId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub price: u32,
}

/// Everything the shop can serve. Requested items are resolved against it.
#[derive(Resource, Debug, Clone, Default)]
pub struct ItemCatalog {
    pub items: Vec<ItemDef>,
}

impl ItemCatalog {
    pub fn get(&self, id: &str) -> Option<&ItemDef> {
        let wanted = id.trim().to_lowercase();
        self.items.iter().find(|item| item.id.to_lowercase() == wanted)
    }

    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Resolves a profile's item name to a catalog id.
    ///
    /// An empty catalog accepts every name as-is. A name the catalog does not
    /// know is replaced by a random catalog item and logged, since it almost
    /// always means a typo in profile data.
    pub fn resolve<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> ItemId {
        if self.items.is_empty() {
            return name.to_string();
        }
        if let Some(item) = self.get(name) {
            return item.id.clone();
        }
        let fallback = &self.items[rng.gen_range(0..self.items.len())];
        warn!(
            "[Items] Unknown item '{}' requested; substituting '{}'",
            name, fallback.id
        );
        fallback.id.clone()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SCRIPTS & REACTIONS
// ═══════════════════════════════════════════════════════════════════════

/// Opaque name of a compiled story script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptHandle(pub String);

impl ScriptHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The resolved outcome of a dialogue session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Reaction {
    Agree,
    #[default]
    Neutral,
    Disagree,
}

/// How a finished session's choices become a `Reaction`.
///
/// One policy applies to a whole `DialoguePlayer`; scripts for a given
/// player are authored against exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReactionPolicy {
    /// Choice index 0 → Agree, 1 → Neutral, 2 → Disagree.
    Positional,
    /// `agree` / `neutral` / `disagree` substrings in the merged tags.
    #[default]
    Tagged,
}

// ═══════════════════════════════════════════════════════════════════════
// CUSTOMER PROFILES
// ═══════════════════════════════════════════════════════════════════════

/// Static template a customer is spawned from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub portrait: Option<String>,
    pub preferred_items: Vec<ItemId>,
    /// Parallel to `preferred_items`: entry i is the order dialogue for item i.
    #[serde(default)]
    pub order_scripts: Vec<Option<ScriptHandle>>,
    /// Played after a successful serve, one picked at random.
    #[serde(default)]
    pub curhat_scripts: Vec<ScriptHandle>,
    pub max_fails: u32,
}

impl CustomerProfile {
    /// Order script for the item at `item_index`; short lists read as `None`.
    pub fn order_script(&self, item_index: usize) -> Option<&ScriptHandle> {
        self.order_scripts.get(item_index).and_then(Option::as_ref)
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct ProfileStore {
    pub profiles: Vec<CustomerProfile>,
}

impl ProfileStore {
    pub fn get(&self, index: usize) -> Option<&CustomerProfile> {
        self.profiles.get(index)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    /// Typewriter speed; `None` shows each line at once.
    pub chars_per_sec: Option<f32>,
    /// Wait for a continue press after each line instead of one tick.
    pub manual_advance: bool,
    /// Choice buttons available on the dialogue panel.
    pub max_choice_buttons: usize,
    pub policy: ReactionPolicy,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            chars_per_sec: Some(40.0),
            manual_advance: true,
            max_choice_buttons: 3,
            policy: ReactionPolicy::Tagged,
        }
    }
}

/// Tunables for the shop loop. Loaded from `kedai.ron` when present.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub min_customers_per_day: usize,
    pub max_customers_per_day: Option<usize>,
    pub between_customers_secs: f32,
    pub day_end_secs: f32,
    pub thanks_secs: f32,
    pub wrong_item_secs: f32,
    pub leaving_secs: f32,
    /// How long the placeholder order line stays up.
    pub order_text_secs: f32,
    pub fade_secs: f32,
    pub thanks_text: String,
    pub wrong_item_text: String,
    pub leaving_text: String,
    /// `{item}` is replaced by the requested item's display name.
    pub placeholder_order_text: String,
    pub base_tip: i64,
    pub agree_tip_multiplier: f32,
    pub disagree_penalty: u32,
    pub walkout_penalty: u32,
    pub starting_hp: u32,
    pub seed: Option<u64>,
    pub dialogue: DialogueSettings,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            min_customers_per_day: 3,
            max_customers_per_day: None,
            between_customers_secs: 1.5,
            day_end_secs: 3.0,
            thanks_secs: 1.2,
            wrong_item_secs: 1.5,
            leaving_secs: 2.0,
            order_text_secs: 3.0,
            fade_secs: 0.5,
            thanks_text: "Thank you!".to_string(),
            wrong_item_text: "Hmm... that's not what I asked for.".to_string(),
            leaving_text: "Forget it, I'm leaving.".to_string(),
            placeholder_order_text: "One {item}, please.".to_string(),
            base_tip: 10,
            agree_tip_multiplier: 2.0,
            disagree_penalty: 1,
            walkout_penalty: 1,
            starting_hp: 5,
            seed: None,
            dialogue: DialogueSettings::default(),
        }
    }
}

impl ShopConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    pub fn placeholder_order(&self, item_name: &str) -> String {
        self.placeholder_order_text.replace("{item}", item_name)
    }
}

/// Random source for rosters and item picks. Seeded from `ShopConfig::seed`.
#[derive(Resource)]
pub struct ShopRng(pub StdRng);

impl ShopRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl FromWorld for ShopRng {
    fn from_world(world: &mut World) -> Self {
        match world.get_resource::<ShopConfig>().and_then(|c| c.seed) {
            Some(seed) => Self::seeded(seed),
            None => Self(StdRng::from_entropy()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INPUT
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone)]
pub struct KeyBindings {
    pub advance_dialogue: KeyCode,
    pub advance_dialogue_alt: KeyCode,
    pub debug_start_day: KeyCode,
    pub debug_next_customer: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            advance_dialogue: KeyCode::Space,
            advance_dialogue_alt: KeyCode::Enter,
            debug_start_day: KeyCode::F1,
            debug_next_customer: KeyCode::F2,
        }
    }
}

/// Per-frame dialogue intents, reset every frame by the input plugin.
#[derive(Resource, Debug, Clone, Default)]
pub struct ShopInput {
    pub continue_pressed: bool,
    pub choice: Option<usize>,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// The player handed an item to the current customer.
#[derive(Event, Debug, Clone)]
pub struct ServeEvent {
    pub item_id: ItemId,
}

/// Begin a new day (first day on entering Playing, or from a debug key).
#[derive(Event, Debug, Clone, Default)]
pub struct StartDayRequest;

/// Send the current customer away, or call the next one in.
#[derive(Event, Debug, Clone, Default)]
pub struct AdvanceCustomerRequest;

#[derive(Event, Debug, Clone)]
pub struct DayStartedEvent {
    pub day: u32,
    pub customers: usize,
}

#[derive(Event, Debug, Clone)]
pub struct DayEndedEvent {
    pub day: u32,
}

#[derive(Event, Debug, Clone)]
pub struct CustomerArrivedEvent {
    pub profile_id: String,
    pub name: String,
    pub requested_item: ItemId,
}

#[derive(Event, Debug, Clone)]
pub struct CustomerLeftEvent {
    pub profile_id: String,
    pub name: String,
    pub served: bool,
}

/// A short line said outside of a dialogue session (thanks, complaints,
/// placeholder orders).
#[derive(Event, Debug, Clone)]
pub struct CustomerSpeechEvent {
    pub speaker: String,
    pub text: String,
    pub duration_secs: f32,
}

/// Outcome of a customer's curhat. Scoring listens; anything else may too.
#[derive(Event, Debug, Clone)]
pub struct ReactionEvent {
    pub profile_id: String,
    pub name: String,
    pub reaction: Reaction,
    pub tags: Vec<String>,
}
