//! Data layer: populates the shop's registries at startup.
//!
//! This plugin runs in OnEnter(GameState::Loading), fills the item catalog,
//! the customer profiles and the story library from data defined in the
//! submodules, then transitions the game into GameState::Playing.
//!
//! No other domain seeds these resources. Everything downstream can read
//! them once GameState has advanced past Loading.

pub mod items;
pub mod profiles;
pub mod scripts;

use bevy::prelude::*;
use crate::shared::*;
use crate::story::StoryLibrary;

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ItemCatalog>()
            .init_resource::<ProfileStore>()
            .init_resource::<StoryLibrary>();
        app.add_systems(OnEnter(GameState::Loading), load_all_data);
    }
}

/// Populates every registry, then opens the shop.
fn load_all_data(
    mut catalog: ResMut<ItemCatalog>,
    mut profiles: ResMut<ProfileStore>,
    mut library: ResMut<StoryLibrary>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    info!("[Data] Populating registries…");

    items::populate_items(&mut catalog);
    info!("[Data]   Items loaded: {}", catalog.items.len());

    profiles::populate_profiles(&mut profiles);
    info!("[Data]   Customer profiles loaded: {}", profiles.len());

    scripts::populate_scripts(&mut library);
    info!("[Data]   Scripts loaded: {}", library.len());

    for profile in &profiles.profiles {
        if profile.order_scripts.len() < profile.preferred_items.len() {
            debug!(
                "[Data] '{}' has {} order scripts for {} items; the rest use the placeholder",
                profile.id,
                profile.order_scripts.len(),
                profile.preferred_items.len()
            );
        }
        for item in &profile.preferred_items {
            if catalog.get(item).is_none() {
                warn!("[Data] '{}' prefers unknown item '{}'", profile.id, item);
            }
        }
    }

    info!("[Data] All registries populated. Opening the shop.");
    next_state.set(GameState::Playing);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_only_prefer_catalog_items() {
        let mut catalog = ItemCatalog::default();
        items::populate_items(&mut catalog);
        let mut store = ProfileStore::default();
        profiles::populate_profiles(&mut store);

        assert_eq!(store.len(), 5);
        for profile in &store.profiles {
            assert!(!profile.preferred_items.is_empty(), "{}", profile.id);
            assert!(profile.max_fails >= 1, "{}", profile.id);
            for item in &profile.preferred_items {
                assert!(catalog.get(item).is_some(), "{} wants {}", profile.id, item);
            }
        }
    }
}
