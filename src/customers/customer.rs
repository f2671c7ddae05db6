use bevy::prelude::*;
use crate::shared::*;

/// The customer at the counter. Owned by `CustomerManager`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub profile_index: usize,
    pub profile_id: String,
    pub name: String,
    /// Index into the profile's `preferred_items` / `order_scripts`.
    pub item_index: usize,
    pub requested_item: ItemId,
    pub fail_count: u32,
    pub max_fails: u32,
}

impl Customer {
    pub fn from_profile(
        profile_index: usize,
        profile: &CustomerProfile,
        item_index: usize,
        requested_item: ItemId,
    ) -> Self {
        Self {
            profile_index,
            profile_id: profile.id.clone(),
            name: profile.name.clone(),
            item_index,
            requested_item,
            fail_count: 0,
            max_fails: profile.max_fails.max(1),
        }
    }

    pub fn accepts(&self, item: &str) -> bool {
        self.requested_item.to_lowercase() == item.trim().to_lowercase()
    }

    /// Counts a wrong serve. Returns `true` once patience has run out.
    pub fn record_wrong_serve(&mut self) -> bool {
        self.fail_count = self.fail_count.saturating_add(1);
        self.has_given_up()
    }

    pub fn has_given_up(&self) -> bool {
        self.fail_count >= self.max_fails
    }
}

/// The on-screen stand-in for the current customer. Fades in on arrival and
/// out on departure; the UI dresses it with a sprite.
#[derive(Component, Debug, Clone)]
pub struct CustomerVisual {
    pub profile_id: String,
    pub name: String,
    pub portrait: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(max_fails: u32) -> CustomerProfile {
        CustomerProfile {
            id: "a".into(),
            name: "A".into(),
            portrait: None,
            preferred_items: vec!["tea".into()],
            order_scripts: vec![],
            curhat_scripts: vec![],
            max_fails,
        }
    }

    #[test]
    fn test_accepts_ignores_case_and_padding() {
        let c = Customer::from_profile(0, &profile(2), 0, "Tea".into());
        assert!(c.accepts("tea"));
        assert!(c.accepts(" TEA "));
        assert!(!c.accepts("coffee"));
    }

    #[test]
    fn test_gives_up_exactly_at_max_fails() {
        let mut c = Customer::from_profile(0, &profile(3), 0, "tea".into());
        assert!(!c.record_wrong_serve());
        assert!(!c.record_wrong_serve());
        assert!(c.record_wrong_serve());
        assert_eq!(c.fail_count, 3);
    }

    #[test]
    fn test_zero_max_fails_is_clamped_to_one() {
        let mut c = Customer::from_profile(0, &profile(0), 0, "tea".into());
        assert_eq!(c.max_fails, 1);
        assert!(c.record_wrong_serve());
    }
}
