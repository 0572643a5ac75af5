//! Pure weight computation.

use std::collections::HashMap;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::AllocationConfig;
use crate::registry::Participant;
use crate::selection::median;

/// Why a competition's weight went to the burn uid.
#[derive(Clone, Debug, PartialEq)]
pub enum BurnReason {
    /// No ledger data, or the newest record is too old.
    Stale { age_secs: Option<i64> },
    /// Fewer canonical games than required.
    TooFewGames { games: u64, required: u64 },
    /// No ranked identity passed the record-count floor.
    NoEligible,
    /// The best average is not positive.
    NoPositive { best: f64 },
    /// Several identities share the best average.
    Tie { average: f64, tied: usize },
    /// The best hotkey has no uid in the registry snapshot.
    NotRegistered { hotkey: String },
}

/// Outcome of one competition's allocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Winner { uid: u16, hotkey: String, average: f64 },
    Burn(BurnReason),
}

/// Everything the decision reads for one competition.
#[derive(Debug)]
pub struct WindowInputs<'a> {
    pub participants: &'a [Participant],
    pub games: u64,
    pub averages: &'a HashMap<String, f64>,
    pub counts: &'a HashMap<String, u64>,
}

/// Length of a weight vector covering every uid and the burn uid.
#[must_use]
pub fn vector_len(participants: &[Participant], burn_uid: u16) -> usize {
    participants
        .iter()
        .map(|p| p.uid)
        .chain(std::iter::once(burn_uid))
        .max()
        .map_or(0, |uid| usize::from(uid) + 1)
}

/// All weight on `burn_uid`.
///
/// ```
/// use clue_arena::allocation::burn_vector;
///
/// assert_eq!(burn_vector(3, 1), vec![0.0, 1.0, 0.0]);
/// ```
#[must_use]
pub fn burn_vector(len: usize, burn_uid: u16) -> Vec<f64> {
    let mut weights = vec![0.0; len];
    if let Some(slot) = weights.get_mut(usize::from(burn_uid)) {
        *slot = 1.0;
    }
    weights
}

/// Winner-take-all decision for one competition.
#[must_use]
pub fn decide(inputs: &WindowInputs<'_>, config: &AllocationConfig) -> Decision {
    if inputs.games < config.min_games {
        return Decision::Burn(BurnReason::TooFewGames {
            games: inputs.games,
            required: config.min_games,
        });
    }

    // Registered identities below the stake minimum never rank. Hotkeys the
    // registry does not know still rank, and burn the slot if they lead.
    let registered: FxHashMap<&str, &Participant> =
        inputs.participants.iter().map(|p| (p.hotkey.as_str(), p)).collect();
    let ranked = |hotkey: &str| {
        registered
            .get(hotkey)
            .map_or(true, |p| p.stake >= config.min_stake)
    };

    let counts: Vec<u64> = inputs
        .averages
        .keys()
        .filter(|hk| ranked(hk.as_str()))
        .map(|hk| inputs.counts.get(hk).copied().unwrap_or(0))
        .collect();
    let floor = (median(&counts) - config.count_slack as f64).max(1.0);

    let mut best = f64::NEG_INFINITY;
    let mut leaders: SmallVec<[&str; 2]> = SmallVec::new();
    for (hotkey, &average) in inputs.averages {
        if !ranked(hotkey.as_str()) {
            continue;
        }
        let count = inputs.counts.get(hotkey).copied().unwrap_or(0);
        if (count as f64) < floor {
            continue;
        }
        if average > best {
            best = average;
            leaders.clear();
            leaders.push(hotkey);
        } else if average == best {
            leaders.push(hotkey);
        }
    }

    match leaders.as_slice() {
        [] => Decision::Burn(BurnReason::NoEligible),
        _ if best <= 0.0 => Decision::Burn(BurnReason::NoPositive { best }),
        [hotkey] => match registered.get(hotkey) {
            Some(p) => Decision::Winner {
                uid: p.uid,
                hotkey: (*hotkey).to_string(),
                average: best,
            },
            None => Decision::Burn(BurnReason::NotRegistered {
                hotkey: (*hotkey).to_string(),
            }),
        },
        tied => Decision::Burn(BurnReason::Tie {
            average: best,
            tied: tied.len(),
        }),
    }
}

/// Weight vector for `decision`, normalized and blended with the burn vector.
#[must_use]
pub fn weights_for(decision: &Decision, len: usize, config: &AllocationConfig) -> Vec<f64> {
    let burn = burn_vector(len, config.burn_uid);
    let Decision::Winner { uid, .. } = decision else {
        return burn;
    };

    let mut weights = vec![0.0; len];
    if let Some(slot) = weights.get_mut(usize::from(*uid)) {
        *slot = 1.0;
    }
    let norm: f64 = weights.iter().map(|w: &f64| w.abs()).sum();
    if norm > 0.0 && norm.is_finite() {
        for w in &mut weights {
            *w /= norm;
        }
    }

    let r = config.burn_ratio;
    weights
        .iter()
        .zip(&burn)
        .map(|(w, b)| (1.0 - r) * w + r * b)
        .collect()
}
