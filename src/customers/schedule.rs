//! The day's roster: which profiles visit today, in which order.

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct DaySchedule {
    pub day: u32,
    roster: Vec<usize>,
    cursor: usize,
}

impl DaySchedule {
    /// Shuffles the profile pool and keeps a random-sized prefix of it.
    pub fn build<R: Rng + ?Sized>(
        day: u32,
        pool_size: usize,
        min_customers: usize,
        max_customers: Option<usize>,
        rng: &mut R,
    ) -> Self {
        let count = roster_size(pool_size, min_customers, max_customers, rng);
        let mut roster: Vec<usize> = (0..pool_size).collect();
        roster.shuffle(rng);
        roster.truncate(count);
        Self {
            day,
            roster,
            cursor: 0,
        }
    }

    pub fn next_profile(&mut self) -> Option<usize> {
        let next = self.roster.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(next)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.roster.len()
    }

    pub fn roster(&self) -> &[usize] {
        &self.roster
    }

    pub fn remaining(&self) -> usize {
        self.roster.len().saturating_sub(self.cursor)
    }
}

/// Customers for one day: uniform in `[min, max]`, where `max` is the pool
/// size (or the configured cap) and both bounds are at least one.
pub fn roster_size<R: Rng + ?Sized>(
    pool_size: usize,
    min_customers: usize,
    max_customers: Option<usize>,
    rng: &mut R,
) -> usize {
    if pool_size == 0 {
        return 0;
    }
    let upper = max_customers.map_or(pool_size, |cap| cap.clamp(1, pool_size));
    let lower = min_customers.clamp(1, upper);
    rng.gen_range(lower..=upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_roster_is_a_permutation_subset() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let schedule = DaySchedule::build(1, 5, 1, None, &mut rng);
            let roster = schedule.roster();
            assert!((1..=5).contains(&roster.len()));
            let unique: HashSet<_> = roster.iter().collect();
            assert_eq!(unique.len(), roster.len(), "no profile twice");
            assert!(roster.iter().all(|&i| i < 5));
        }
    }

    #[test]
    fn test_next_profile_walks_roster_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut schedule = DaySchedule::build(1, 4, 4, None, &mut rng);
        let expected = schedule.roster().to_vec();
        let mut seen = Vec::new();
        while let Some(i) = schedule.next_profile() {
            seen.push(i);
        }
        assert_eq!(seen, expected);
        assert!(schedule.is_exhausted());
        assert_eq!(schedule.remaining(), 0);
    }

    #[test]
    fn test_roster_size_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(roster_size(0, 3, None, &mut rng), 0);
        assert_eq!(roster_size(5, 10, None, &mut rng), 5, "min clamps to pool");
        assert_eq!(roster_size(5, 0, Some(1), &mut rng), 1);
        for _ in 0..100 {
            let n = roster_size(6, 2, Some(4), &mut rng);
            assert!((2..=4).contains(&n));
        }
    }
}
