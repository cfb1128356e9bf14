use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BtcError;

/// Identifies a previous transaction output as `"<txid>:<vout>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtxoId {
    txid: String,
    vout: u32,
}

impl UtxoId {
    /// Build an id from a transaction hash (64 hex chars, display order)
    /// and an output index.
    pub fn from_tx_hash_and_vout(txid: &str, vout: u32) -> Result<Self, BtcError> {
        if txid.len() != 64 || !txid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BtcError::MalformedUtxoId(format!("{txid}:{vout}")));
        }
        Ok(Self {
            txid: txid.to_ascii_lowercase(),
            vout,
        })
    }

    pub fn txid(&self) -> &str {
        &self.txid
    }

    pub fn vout(&self) -> u32 {
        self.vout
    }
}

impl std::fmt::Display for UtxoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl FromStr for UtxoId {
    type Err = BtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Exactly one separator.
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(txid), Some(vout), None) => {
                let vout = vout
                    .parse::<u32>()
                    .map_err(|_| BtcError::MalformedUtxoId(s.to_string()))?;
                Self::from_tx_hash_and_vout(txid, vout)
            }
            _ => Err(BtcError::MalformedUtxoId(s.to_string())),
        }
    }
}

impl TryFrom<String> for UtxoId {
    type Error = BtcError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<UtxoId> for String {
    fn from(id: UtxoId) -> Self {
        id.to_string()
    }
}

/// An unspent output available for spending, as reported by the external
/// blockchain-data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub utxo_id: UtxoId,
    pub amount_sat: u64,
}

/// Coin selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Smallest single UTXO covering the target; falls back to `RandomDraw`
    /// when no single UTXO is large enough.
    Single,
    /// Single Random Draw: repeated shuffled greedy accumulation, keeping
    /// the draw that locks the least value.
    RandomDraw,
}

/// Selects which unspent outputs fund a payment.
///
/// Randomness is injected by the caller so selection stays a pure function
/// of `(inputs, rng state)` and tests can force deterministic orderings.
#[derive(Debug, Clone)]
pub struct InputSelector {
    iterations: u32,
}

impl Default for InputSelector {
    fn default() -> Self {
        Self { iterations: 10 }
    }
}

struct SelectionCandidate {
    inputs: Vec<UnspentOutput>,
    amount_locked_sat: u64,
}

impl InputSelector {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Choose a subset of `available` totalling at least `amount + fee`.
    ///
    /// Fails with `InsufficientFunds` before trying any strategy when the
    /// whole candidate set cannot cover the target.
    pub fn select_inputs<R: Rng + ?Sized>(
        &self,
        amount_sat: u64,
        fee_sat: u64,
        available: &[UnspentOutput],
        strategy: SelectionStrategy,
        rng: &mut R,
    ) -> Result<Vec<UnspentOutput>, BtcError> {
        let target = amount_sat + fee_sat;
        let total_available: u64 = available.iter().map(|u| u.amount_sat).sum();

        if total_available < target {
            return Err(BtcError::InsufficientFunds {
                needed_sat: target,
                available_sat: total_available,
            });
        }

        if strategy == SelectionStrategy::Single {
            if let Some(candidate) = self.single_utxo(target, available) {
                debug!(
                    locked_sat = candidate.amount_locked_sat,
                    "selected single utxo"
                );
                return Ok(candidate.inputs);
            }
        }

        let best = (0..self.iterations)
            .filter_map(|_| self.single_random_draw(target, available, rng))
            .min_by_key(|c| c.amount_locked_sat);

        match best {
            Some(candidate) => {
                debug!(
                    inputs = candidate.inputs.len(),
                    locked_sat = candidate.amount_locked_sat,
                    "selected inputs by random draw"
                );
                Ok(candidate.inputs)
            }
            None => Err(BtcError::InsufficientFunds {
                needed_sat: target,
                available_sat: total_available,
            }),
        }
    }

    // see https://murch.one/wp-content/uploads/2016/11/erhardt2016coinselection.pdf
    fn single_random_draw<R: Rng + ?Sized>(
        &self,
        target_sat: u64,
        available: &[UnspentOutput],
        rng: &mut R,
    ) -> Option<SelectionCandidate> {
        let mut shuffled: Vec<&UnspentOutput> = available.iter().collect();
        shuffled.shuffle(rng);

        let mut selected = Vec::new();
        let mut selected_sat: u64 = 0;
        for input in shuffled {
            selected.push(input.clone());
            selected_sat += input.amount_sat;
            if selected_sat >= target_sat {
                return Some(SelectionCandidate {
                    inputs: selected,
                    amount_locked_sat: selected_sat,
                });
            }
        }
        None
    }

    fn single_utxo(&self, target_sat: u64, available: &[UnspentOutput]) -> Option<SelectionCandidate> {
        let mut sorted: Vec<&UnspentOutput> = available.iter().collect();
        sorted.sort_by_key(|u| u.amount_sat);
        sorted
            .into_iter()
            .find(|u| u.amount_sat >= target_sat)
            .map(|u| SelectionCandidate {
                inputs: vec![u.clone()],
                amount_locked_sat: u.amount_sat,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn utxo(n: u8, amount_sat: u64) -> UnspentOutput {
        let txid = format!("{:02x}", n).repeat(32);
        UnspentOutput {
            utxo_id: UtxoId::from_tx_hash_and_vout(&txid, 0).unwrap(),
            amount_sat,
        }
    }

    #[test]
    fn utxo_id_display_roundtrip() {
        let txid = "ab".repeat(32);
        let id = UtxoId::from_tx_hash_and_vout(&txid, 3).unwrap();
        assert_eq!(id.to_string(), format!("{txid}:3"));
        assert_eq!(id.vout(), 3);

        let parsed: UtxoId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.vout(), 3);
    }

    #[test]
    fn utxo_id_rejects_missing_or_extra_colons() {
        assert!("abcd".parse::<UtxoId>().is_err());
        assert!(format!("{}:1:2", "ab".repeat(32)).parse::<UtxoId>().is_err());
    }

    #[test]
    fn utxo_id_rejects_short_txid() {
        assert!("abcd:0".parse::<UtxoId>().is_err());
    }

    #[test]
    fn utxo_id_rejects_non_numeric_vout() {
        assert!(format!("{}:x", "ab".repeat(32)).parse::<UtxoId>().is_err());
    }

    #[test]
    fn utxo_id_serde_as_string() {
        let id = UtxoId::from_tx_hash_and_vout(&"cd".repeat(32), 7).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}:7\"", "cd".repeat(32)));
        let back: UtxoId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn single_strategy_picks_smallest_covering_utxo() {
        // Scenario: single-strategy must deterministically pick the 50k UTXO.
        let available = vec![utxo(1, 10_000), utxo(2, 5_000), utxo(3, 50_000)];
        let selector = InputSelector::default();
        let mut rng = StdRng::seed_from_u64(1);

        let selected = selector
            .select_inputs(12_000, 500, &available, SelectionStrategy::Single, &mut rng)
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].amount_sat, 50_000);
    }

    #[test]
    fn single_strategy_falls_back_to_random_draw() {
        // No single UTXO covers 12_500, but subsets do.
        let available = vec![utxo(1, 10_000), utxo(2, 5_000), utxo(3, 4_000)];
        let selector = InputSelector::default();
        let mut rng = StdRng::seed_from_u64(1);

        let selected = selector
            .select_inputs(12_000, 500, &available, SelectionStrategy::Single, &mut rng)
            .unwrap();
        let total: u64 = selected.iter().map(|u| u.amount_sat).sum();
        assert!(total >= 12_500);
        assert!(selected.len() >= 2);
    }

    #[test]
    fn random_draw_covers_target_without_duplicates() {
        let available = vec![utxo(1, 10_000), utxo(2, 5_000), utxo(3, 50_000)];
        let selector = InputSelector::default();
        let mut rng = StdRng::seed_from_u64(7);

        let selected = selector
            .select_inputs(12_000, 500, &available, SelectionStrategy::RandomDraw, &mut rng)
            .unwrap();
        let total: u64 = selected.iter().map(|u| u.amount_sat).sum();
        assert!(total >= 12_500);
        assert!(!selected.is_empty());

        // Subset of candidates, no duplicates.
        let mut ids: Vec<_> = selected.iter().map(|u| u.utxo_id.clone()).collect();
        ids.sort_by_key(|id| id.to_string());
        ids.dedup();
        assert_eq!(ids.len(), selected.len());
        for s in &selected {
            assert!(available.contains(s));
        }
    }

    #[test]
    fn insufficient_funds_raised_before_any_strategy() {
        // Scenario: candidates total 9_000, target 10_100.
        let available = vec![utxo(1, 4_000), utxo(2, 5_000)];
        let selector = InputSelector::default();
        let mut rng = StdRng::seed_from_u64(1);

        let err = selector
            .select_inputs(10_000, 100, &available, SelectionStrategy::RandomDraw, &mut rng)
            .unwrap_err();
        match err {
            BtcError::InsufficientFunds {
                needed_sat,
                available_sat,
            } => {
                assert_eq!(needed_sat, 10_100);
                assert_eq!(available_sat, 9_000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deterministic_under_injected_rng() {
        let available: Vec<UnspentOutput> =
            (1..=20).map(|n| utxo(n, 1_000 * u64::from(n))).collect();
        let selector = InputSelector::default();

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = selector
            .select_inputs(25_000, 900, &available, SelectionStrategy::RandomDraw, &mut rng_a)
            .unwrap();
        let b = selector
            .select_inputs(25_000, 900, &available, SelectionStrategy::RandomDraw, &mut rng_b)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn exact_cover_is_accepted() {
        let available = vec![utxo(1, 12_500)];
        let selector = InputSelector::default();
        let mut rng = StdRng::seed_from_u64(3);

        let selected = selector
            .select_inputs(12_000, 500, &available, SelectionStrategy::RandomDraw, &mut rng)
            .unwrap();
        assert_eq!(selected.len(), 1);
    }
}
