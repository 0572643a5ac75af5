//! Cascading pool filters.
//!
//! Every filter works on the survivors of the previous one:
//!
//! 1. stake, commitment and exclusion checks (done by the selector)
//! 2. minimum-count tier of the epoch window
//! 3. minimum-count tier of the scoring window (first slot)
//! 4. median bound and count cap on the scoring window (second slot)

use crate::registry::{EndpointRef, Participant};

/// A participant that passed the stake and commitment checks.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub participant: Participant,
    pub endpoint: EndpointRef,
    /// Games in the epoch window.
    pub epoch_count: u64,
    /// Games in the scoring window.
    pub window_count: u64,
    /// Average score in the scoring window; 0 without games.
    pub score: f64,
}

impl Candidate {
    #[must_use]
    pub fn uid(&self) -> u16 {
        self.participant.uid
    }

    #[must_use]
    pub fn hotkey(&self) -> &str {
        &self.participant.hotkey
    }
}

/// Candidates sharing the smallest `key`.
#[must_use]
pub fn min_tier(candidates: &[Candidate], key: impl Fn(&Candidate) -> u64) -> Vec<Candidate> {
    let Some(min) = candidates.iter().map(&key).min() else {
        return Vec::new();
    };
    candidates.iter().filter(|c| key(c) == min).cloned().collect()
}

/// First-slot pool: epoch tier, then scoring-window tier.
#[must_use]
pub fn first_slot_pool(candidates: &[Candidate]) -> Vec<Candidate> {
    let epoch = min_tier(candidates, |c| c.epoch_count);
    min_tier(&epoch, |c| c.window_count)
}

/// Median of `values`; 0 for an empty slice.
#[must_use]
pub fn median(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Second-slot pool.
///
/// Takes the epoch tier, then drops candidates whose scoring-window count
/// exceeds the tier's median by more than `median_slack`. Returns `None`
/// when even the smallest count is above `cap`.
#[must_use]
pub fn second_slot_pool(candidates: &[Candidate], median_slack: u64, cap: u64) -> Option<Vec<Candidate>> {
    let epoch = min_tier(candidates, |c| c.epoch_count);
    let min_count = epoch.iter().map(|c| c.window_count).min()?;
    if min_count > cap {
        return None;
    }
    let counts: Vec<u64> = epoch.iter().map(|c| c.window_count).collect();
    let bound = median(&counts) + median_slack as f64;
    Some(
        epoch
            .into_iter()
            .filter(|c| c.window_count as f64 <= bound)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(uid: u16, epoch: u64, window: u64, score: f64) -> Candidate {
        Candidate {
            participant: Participant::new(uid, format!("hk{uid}"), 1.0),
            endpoint: EndpointRef::parse(&format!("ep-{uid}")).unwrap(),
            epoch_count: epoch,
            window_count: window,
            score,
        }
    }

    fn uids(cands: &[Candidate]) -> Vec<u16> {
        cands.iter().map(Candidate::uid).collect()
    }

    #[test]
    fn test_first_slot_cascade() {
        let cands = vec![
            cand(1, 0, 5, 0.0),
            cand(2, 0, 3, 0.0),
            cand(3, 1, 0, 0.0),
            cand(4, 0, 3, 0.0),
        ];
        // uid 3 has the lowest window count but is outside the epoch tier
        assert_eq!(uids(&first_slot_pool(&cands)), vec![2, 4]);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3, 1, 2]), 2.0);
        assert_eq!(median(&[4, 1, 3, 2]), 2.5);
    }

    #[test]
    fn test_second_slot_median_bound() {
        let cands = vec![
            cand(1, 0, 1, 0.0),
            cand(2, 0, 2, 0.0),
            cand(3, 0, 3, 0.0),
            cand(4, 0, 9, 0.0),
            cand(5, 2, 0, 0.0),
        ];
        // tier {1,2,3,4}, median 2.5, bound 4.5
        let pool = second_slot_pool(&cands, 2, 50).unwrap();
        assert_eq!(uids(&pool), vec![1, 2, 3]);
    }

    #[test]
    fn test_second_slot_cap_aborts() {
        let cands = vec![cand(1, 0, 51, 0.0), cand(2, 0, 60, 0.0)];
        assert_eq!(second_slot_pool(&cands, 2, 50), None);
        assert!(second_slot_pool(&[], 2, 50).is_none());
    }
}
