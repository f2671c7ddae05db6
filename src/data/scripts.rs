use bevy::prelude::*;
use crate::story::StoryLibrary;

/// Script bundles compiled into the binary: (bundle name, RON source).
const BUNDLES: &[(&str, &str)] = &[
    ("orders", include_str!("scripts/orders.ron")),
    ("curhat", include_str!("scripts/curhat.ron")),
];

/// Loads every bundle. A bundle that fails to parse is logged and skipped;
/// plays of its scripts then resolve neutral.
pub fn populate_scripts(library: &mut StoryLibrary) {
    for (name, source) in BUNDLES {
        match library.load_bundle(source) {
            Ok(count) => debug!("[Data] Bundle '{}': {} scripts", name, count),
            Err(err) => warn!("[Data] Skipping script bundle '{}': {}", name, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::profiles::populate_profiles;
    use crate::shared::ProfileStore;
    use crate::story::StoryEngine;

    #[test]
    fn test_all_bundles_parse() {
        for (name, source) in BUNDLES {
            let mut library = StoryLibrary::default();
            assert!(library.load_bundle(source).is_ok(), "bundle {} failed", name);
        }
    }

    #[test]
    fn test_every_profile_script_opens() {
        let mut library = StoryLibrary::default();
        populate_scripts(&mut library);
        let mut store = ProfileStore::default();
        populate_profiles(&mut store);

        for profile in &store.profiles {
            let scripts = profile
                .order_scripts
                .iter()
                .flatten()
                .chain(profile.curhat_scripts.iter());
            for script in scripts {
                assert!(
                    library.open(script).is_ok(),
                    "{} references unplayable script {}",
                    profile.id,
                    script
                );
            }
        }
    }
}
