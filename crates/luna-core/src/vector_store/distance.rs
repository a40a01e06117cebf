//! Distance metric and top-K selection.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::models::RecordId;
use crate::error::{LunaError, Result};

/// Cosine distance, `1 - cos(a, b)`.
///
/// Vectors of different length are rejected rather than truncated. A
/// zero-magnitude vector has no direction and is treated as orthogonal to
/// everything (distance 1.0).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(LunaError::dimension_mismatch(a.len(), b.len()));
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(1.0);
    }

    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    Ok((1.0 - similarity) as f32)
}

/// A scored record position. Orders by distance, then by record id, so the
/// heap's maximum is always the worst-ranked candidate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub distance: f32,
    pub id: RecordId,
    pub index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Keep the `k` best candidates in O(n log k), returned best first.
pub(crate) fn select_top_k<I>(candidates: I, k: usize) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    if k == 0 {
        return Vec::new();
    }

    let candidates = candidates.into_iter();
    // `k` is caller-controlled and may be far larger than the input.
    let (available, _) = candidates.size_hint();
    let mut heap = BinaryHeap::with_capacity(k.min(available).saturating_add(1));
    for candidate in candidates {
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }
    }
    heap.into_sorted_vec()
}
