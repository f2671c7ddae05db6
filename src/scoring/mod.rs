//! Scoring domain: tips, satisfaction HP and the day's tallies.
//!
//! Listens to `ReactionEvent` (the reaction hook) and `CustomerLeftEvent`.
//! Nothing here can fail; bad tag values are logged and skipped.

use bevy::prelude::*;
use crate::shared::*;

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct ShopScore {
    pub gold: u32,
    pub hp: u32,
    pub served: u32,
    pub walkouts: u32,
    pub agreed: u32,
    pub neutral: u32,
    pub disagreed: u32,
}

impl ShopScore {
    pub fn new(starting_hp: u32) -> Self {
        Self {
            gold: 0,
            hp: starting_hp,
            served: 0,
            walkouts: 0,
            agreed: 0,
            neutral: 0,
            disagreed: 0,
        }
    }

    /// Clamps at 0 and `u32::MAX`.
    pub fn add_gold(&mut self, amount: i64) {
        let magnitude = u32::try_from(amount.unsigned_abs()).unwrap_or(u32::MAX);
        if amount >= 0 {
            self.gold = self.gold.saturating_add(magnitude);
        } else {
            self.gold = self.gold.saturating_sub(magnitude);
        }
    }

    pub fn adjust_hp(&mut self, amount: i64) {
        let magnitude = u32::try_from(amount.unsigned_abs()).unwrap_or(u32::MAX);
        if amount >= 0 {
            self.hp = self.hp.saturating_add(magnitude);
        } else {
            self.hp = self.hp.saturating_sub(magnitude);
        }
    }
}

impl FromWorld for ShopScore {
    fn from_world(world: &mut World) -> Self {
        let starting_hp = world
            .get_resource::<ShopConfig>()
            .map_or(ShopConfig::default().starting_hp, |config| config.starting_hp);
        Self::new(starting_hp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagAmount {
    Tip(i64),
    Hp(i64),
}

/// Reads `tip:<int>` and `hp:<int>` tags. Other tags are not ours.
fn parse_amount_tag(tag: &str) -> Option<TagAmount> {
    let tag = tag.trim().to_lowercase();
    let (kind, value): (fn(i64) -> TagAmount, &str) = if let Some(v) = tag.strip_prefix("tip:") {
        (TagAmount::Tip, v)
    } else if let Some(v) = tag.strip_prefix("hp:") {
        (TagAmount::Hp, v)
    } else {
        return None;
    };
    match value.trim().parse::<i64>() {
        Ok(n) => Some(kind(n)),
        Err(_) => {
            warn!("[Scoring] Ignoring malformed tag '{}'", tag);
            None
        }
    }
}

/// The reaction hook: tip and HP for one finished curhat.
pub fn apply_reaction(
    score: &mut ShopScore,
    config: &ShopConfig,
    reaction: Reaction,
    tags: &[String],
) {
    let mut tip = match reaction {
        Reaction::Agree => (config.base_tip as f64 * f64::from(config.agree_tip_multiplier)).round() as i64,
        Reaction::Neutral => config.base_tip,
        Reaction::Disagree => 0,
    };
    let mut hp = 0i64;
    match reaction {
        Reaction::Agree => score.agreed += 1,
        Reaction::Neutral => score.neutral += 1,
        Reaction::Disagree => {
            score.disagreed += 1;
            hp -= i64::from(config.disagree_penalty);
        }
    }

    for tag in tags {
        match parse_amount_tag(tag) {
            Some(TagAmount::Tip(n)) => tip = tip.saturating_add(n),
            Some(TagAmount::Hp(n)) => hp = hp.saturating_add(n),
            None => {}
        }
    }

    score.add_gold(tip);
    score.adjust_hp(hp);
    info!(
        "[Scoring] {:?}: tip {:+}, hp {:+} -> {}g, {} hp",
        reaction, tip, hp, score.gold, score.hp
    );
}

/// System: apply every reaction from this frame.
pub fn handle_reactions(
    mut events: EventReader<ReactionEvent>,
    config: Res<ShopConfig>,
    mut score: ResMut<ShopScore>,
) {
    for ev in events.read() {
        debug!("[Scoring] Reaction from {}", ev.name);
        apply_reaction(&mut score, &config, ev.reaction, &ev.tags);
    }
}

/// System: count departures; a walkout costs HP.
pub fn handle_departures(
    mut events: EventReader<CustomerLeftEvent>,
    config: Res<ShopConfig>,
    mut score: ResMut<ShopScore>,
) {
    for ev in events.read() {
        if ev.served {
            score.served += 1;
        } else {
            score.walkouts += 1;
            score.adjust_hp(-i64::from(config.walkout_penalty));
            info!("[Scoring] {} walked out. HP now {}", ev.name, score.hp);
        }
    }
}

/// Format a gold amount as a display string (e.g. "1,234g").
pub fn format_gold(amount: u32) -> String {
    let digits: Vec<char> = amount.to_string().chars().collect();
    let mut result = String::new();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*ch);
    }
    result.push('g');
    result
}

pub struct ScoringPlugin;

impl Plugin for ScoringPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShopScore>();
        app.add_systems(
            Update,
            (handle_reactions, handle_departures).in_set(ShopSet::Scoring),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reactions_pay_by_policy() {
        let config = ShopConfig::default();
        let mut score = ShopScore::new(5);

        apply_reaction(&mut score, &config, Reaction::Agree, &[]);
        assert_eq!(score.gold, 20);
        apply_reaction(&mut score, &config, Reaction::Neutral, &[]);
        assert_eq!(score.gold, 30);
        apply_reaction(&mut score, &config, Reaction::Disagree, &[]);
        assert_eq!(score.gold, 30);
        assert_eq!(score.hp, 4);
        assert_eq!((score.agreed, score.neutral, score.disagreed), (1, 1, 1));
    }

    #[test]
    fn test_amount_tags_adjust_tip_and_hp() {
        let config = ShopConfig::default();
        let mut score = ShopScore::new(5);
        apply_reaction(
            &mut score,
            &config,
            Reaction::Neutral,
            &tags(&["mood:warm", "TIP:5", "hp:+2"]),
        );
        assert_eq!(score.gold, 15);
        assert_eq!(score.hp, 7);
    }

    #[test]
    fn test_malformed_tags_are_ignored() {
        let config = ShopConfig::default();
        let mut score = ShopScore::new(5);
        apply_reaction(&mut score, &config, Reaction::Neutral, &tags(&["tip:lots", "hp:"]));
        assert_eq!(score.gold, 10);
        assert_eq!(score.hp, 5);
    }

    #[test]
    fn test_hp_and_gold_never_go_negative() {
        let config = ShopConfig::default();
        let mut score = ShopScore::new(1);
        apply_reaction(
            &mut score,
            &config,
            Reaction::Disagree,
            &tags(&["tip:-500", "hp:-9"]),
        );
        assert_eq!(score.gold, 0);
        assert_eq!(score.hp, 0);
    }

    #[test]
    fn test_format_gold() {
        assert_eq!(format_gold(0), "0g");
        assert_eq!(format_gold(1234), "1,234g");
        assert_eq!(format_gold(1000000), "1,000,000g");
    }
}
