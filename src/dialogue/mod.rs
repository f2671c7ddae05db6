//! Dialogue domain plugin for Kedai.
//!
//! Owns the `DialoguePlayer` resource and advances it once per frame from
//! `ShopInput`. The customer orchestrator starts sessions and collects their
//! outcomes; the UI renders `DialoguePlayer::view`.

use bevy::prelude::*;
use crate::shared::*;

mod player;
pub mod reaction;

pub use player::{DialogueOutcome, DialoguePlayer, DialogueView, PlayRejected, PlaybackTicket};

pub struct DialoguePlugin;

impl Plugin for DialoguePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialoguePlayer>()
            .init_resource::<ShopInput>();

        app.add_systems(
            Update,
            (
                apply_dialogue_settings.run_if(resource_exists_and_changed::<ShopConfig>),
                drive_dialogue_player,
            )
                .chain()
                .in_set(ShopSet::Dialogue),
        );
    }
}

/// System: push config edits into the player.
pub fn apply_dialogue_settings(config: Res<ShopConfig>, mut player: ResMut<DialoguePlayer>) {
    if *player.settings() != config.dialogue {
        player.set_settings(config.dialogue.clone());
    }
}

/// System: feed this frame's continue press / choice into the player, then
/// advance it one tick.
pub fn drive_dialogue_player(
    time: Res<Time>,
    input: Res<ShopInput>,
    mut player: ResMut<DialoguePlayer>,
) {
    if input.continue_pressed {
        player.press_continue();
    }
    if let Some(index) = input.choice {
        player.choose(index);
    }
    player.advance(time.delta());
}
