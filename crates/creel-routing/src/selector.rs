//! Weighted bucket selection.
//!
//! Pure: no I/O and no clock. The PRNG is injected so tests can pin draws;
//! production passes the per-thread generator.

use std::cmp::Ordering;

use creel_store::RouteTable;
use rand::Rng;
use tracing::debug;

use crate::bucket::BucketRef;

/// A valid bucket paired with its precomputed weight.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The bucket under consideration.
    pub bucket: BucketRef,
    /// Its weight for the requested size, in (0, 1].
    pub weight: f64,
}

/// Pick one bucket from `candidates`, sampling proportionally to weight.
///
/// A candidate whose replica groups are not all present in the route table
/// has its weight divided by 100 — a strong penalty, but the bucket can
/// still win when nothing better exists. Candidates are walked from the
/// highest weight down while a draw from `[0, sum]` (one-decimal
/// resolution) is decremented; the first candidate to push the draw to zero
/// is returned.
///
/// When the total weight is too small for the draw to resolve at all
/// (`sum * 10 < 1`), the highest-weighted candidate wins outright.
///
/// Returns `None` only when `candidates` is empty.
pub fn select_bucket<R: Rng>(
    mut candidates: Vec<Candidate>,
    routes: &RouteTable,
    rng: &mut R,
) -> Option<BucketRef> {
    if candidates.is_empty() {
        return None;
    }

    let mut sum = 0.0;
    for candidate in &mut candidates {
        let groups = candidate.bucket.meta().groups;
        if !routes.covers(&groups) {
            candidate.weight /= 100.0;
        }
        sum += candidate.weight;
    }

    // Highest weight first.
    candidates.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));

    let steps = (sum * 10.0).floor() as i64;
    if steps < 1 {
        return candidates.into_iter().next().map(|c| c.bucket);
    }

    let mut draw = rng.random_range(0..=steps) as f64 / 10.0;
    debug!(
        candidates = candidates.len(),
        draw, sum, "weighted bucket selection"
    );

    for candidate in &candidates {
        draw -= candidate.weight;
        if draw <= 0.0 {
            return Some(candidate.bucket.clone());
        }
    }

    // Rounding can leave a residue past the last candidate; the draw was
    // within the total, so the tail candidate takes it.
    candidates.last().map(|c| c.bucket.clone())
}
