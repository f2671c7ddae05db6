//! Turning a finished session's choices and tags into a `Reaction`.

use crate::shared::{Reaction, ReactionPolicy};

/// Chosen-choice tags first, then tags from the lines that followed the
/// choice. Duplicates are dropped, keeping the first occurrence.
pub fn merge_tags(chosen: &[String], trailing: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(chosen.len() + trailing.len());
    for tag in chosen.iter().chain(trailing) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}

pub fn resolve_reaction(
    policy: ReactionPolicy,
    chosen_index: Option<usize>,
    tags: &[String],
) -> Reaction {
    match policy {
        ReactionPolicy::Positional => chosen_index.map_or(Reaction::Neutral, reaction_for_index),
        ReactionPolicy::Tagged => reaction_from_tags(tags).unwrap_or(Reaction::Neutral),
    }
}

pub fn reaction_for_index(index: usize) -> Reaction {
    match index {
        0 => Reaction::Agree,
        2 => Reaction::Disagree,
        _ => Reaction::Neutral,
    }
}

/// First tag that names a reaction wins. `disagree` is checked before
/// `agree` because it contains it.
pub fn reaction_from_tags(tags: &[String]) -> Option<Reaction> {
    tags.iter().find_map(|tag| {
        let tag = tag.to_lowercase();
        if tag.contains("disagree") {
            Some(Reaction::Disagree)
        } else if tag.contains("agree") {
            Some(Reaction::Agree)
        } else if tag.contains("neutral") {
            Some(Reaction::Neutral)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let merged = merge_tags(
            &tags(&["reaction:agree", "mood:warm"]),
            &tags(&["mood:warm", "tip:5", "reaction:agree", "ending"]),
        );
        assert_eq!(merged, tags(&["reaction:agree", "mood:warm", "tip:5", "ending"]));
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        assert!(merge_tags(&[], &[]).is_empty());
    }

    #[test]
    fn test_positional_policy() {
        let none: Vec<String> = Vec::new();
        assert_eq!(resolve_reaction(ReactionPolicy::Positional, Some(0), &none), Reaction::Agree);
        assert_eq!(resolve_reaction(ReactionPolicy::Positional, Some(1), &none), Reaction::Neutral);
        assert_eq!(resolve_reaction(ReactionPolicy::Positional, Some(2), &none), Reaction::Disagree);
        assert_eq!(resolve_reaction(ReactionPolicy::Positional, Some(3), &none), Reaction::Neutral);
        assert_eq!(resolve_reaction(ReactionPolicy::Positional, None, &none), Reaction::Neutral);
    }

    #[test]
    fn test_positional_policy_ignores_tags() {
        let t = tags(&["reaction:disagree"]);
        assert_eq!(resolve_reaction(ReactionPolicy::Positional, Some(0), &t), Reaction::Agree);
    }

    #[test]
    fn test_tagged_policy_is_case_insensitive_and_first_match_wins() {
        let t = tags(&["mood:warm", "Reaction:AGREE", "disagree"]);
        assert_eq!(resolve_reaction(ReactionPolicy::Tagged, Some(2), &t), Reaction::Agree);
        assert_eq!(reaction_from_tags(&tags(&["NEUTRAL"])), Some(Reaction::Neutral));
    }

    #[test]
    fn test_tagged_policy_does_not_read_disagree_as_agree() {
        assert_eq!(
            reaction_from_tags(&tags(&["reaction:disagree"])),
            Some(Reaction::Disagree)
        );
    }

    #[test]
    fn test_tagged_policy_defaults_to_neutral() {
        let t = tags(&["mood:warm"]);
        assert_eq!(resolve_reaction(ReactionPolicy::Tagged, Some(0), &t), Reaction::Neutral);
    }
}
