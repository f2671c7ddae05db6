//! Presentation for the shop: dialogue panel, speech toasts, HUD, serve tray
//! and customer sprites. Everything here reads shared state or emits shared
//! events; no game rules live in the UI.

mod counter;
mod dialogue_box;
mod hud;
mod serve_tray;
mod toast;
mod transitions;

use bevy::prelude::*;
use crate::shared::*;

pub use toast::ToastEvent;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ToastEvent>();

        // ─── ALWAYS PRESENT ───
        app.add_systems(
            Startup,
            (
                dialogue_box::attach_dialogue_surface,
                dialogue_box::spawn_dialogue_box,
                toast::spawn_toast_container,
                transitions::spawn_fade_overlay,
            ),
        );

        // ─── CLICKS: become input before the dialogue/serve sets run ───
        app.add_systems(
            Update,
            (
                dialogue_box::choice_button_clicks,
                serve_tray::serve_button_clicks,
            )
                .in_set(ShopSet::Input)
                .run_if(in_state(GameState::Playing)),
        );

        // ─── DIALOGUE PANEL: mirrors the player after it advanced ───
        app.add_systems(
            Update,
            dialogue_box::sync_dialogue_box.after(ShopSet::Dialogue),
        );

        // ─── HUD & TRAY ───
        app.add_systems(
            OnEnter(GameState::Playing),
            (hud::spawn_hud, serve_tray::spawn_serve_tray),
        );
        app.add_systems(
            Update,
            (
                hud::update_day_display,
                hud::update_order_display,
                hud::update_score_display,
            )
                .after(ShopSet::Scoring)
                .run_if(in_state(GameState::Playing)),
        );

        // ─── TOASTS, SPRITES & DAY FADE ───
        app.add_systems(
            Update,
            (
                (
                    toast::wire_speech_toasts,
                    toast::wire_day_toasts,
                    toast::wire_reaction_toasts,
                ),
                toast::handle_toast_events,
                toast::update_toasts,
            )
                .chain()
                .after(ShopSet::Effects),
        );
        app.add_systems(
            Update,
            (
                counter::dress_customer_visuals,
                transitions::trigger_fade_on_day_change,
                transitions::update_fade,
            )
                .after(ShopSet::Effects),
        );
    }
}
