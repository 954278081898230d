// THEORY:
// The `SliceValidator` decides which contour boxes are real brain slices. Contour
// tracing on a slice sheet over-reports: labels, tick marks and speckle produce
// tiny boxes, the sheet frame produces a giant one, and a single slice with a
// dark gap through it can split into several neighbouring boxes.
//
// Resolution rules, applied box by box:
// 1.  **Size Filter**: A box narrower/shorter than `min_dimension` or wider/taller
//     than `max_dimension` is dropped outright.
// 2.  **First Acceptance**: The first surviving box is accepted unconditionally.
// 3.  **Overlap Resolution**: A new box, grown by `margin`, is tested against every
//     accepted box (not grown). On overlap the strictly larger area wins: a larger
//     newcomer marks the incumbent as superseded, anything else marks the newcomer
//     invalid. The scan always runs to the end, so one newcomer can supersede
//     several incumbents even when it is itself invalid.
// 4.  **Deferred Removal**: Superseded boxes stay in the candidate set (and keep
//     taking part in comparisons) until the pass ends, then are all removed.
//
// The pass is a small state machine over `BoxState`. The order boxes are fed in is
// chosen by `DedupePolicy`: descending area (stable) or raw discovery order.

use crate::config::{DedupePolicy, SlicerConfig};
use crate::core_modules::bounding_box::BoundingBox;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Lifecycle of a box during one dedupe pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    Pending,
    Accepted,
    /// Overlapped an incumbent of equal or larger area.
    Rejected,
    /// Was accepted, then lost to a strictly larger newcomer.
    Superseded,
}

/// Outcome of offering one box to the candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub state: BoxState,
    /// Incumbents this box marked as superseded.
    pub superseded: Vec<BoundingBox>,
}

/// Pass-scoped candidate state: boxes valid so far plus boxes awaiting removal.
#[derive(Debug, Default)]
pub struct CandidateSet {
    margin: u32,
    candidates: Vec<BoundingBox>,
    rejected: HashSet<BoundingBox>,
}

impl CandidateSet {
    pub fn new(margin: u32) -> Self {
        Self {
            margin,
            candidates: Vec::new(),
            rejected: HashSet::new(),
        }
    }

    /// Resolves `newcomer` against every current candidate.
    pub fn offer(&mut self, newcomer: BoundingBox) -> Verdict {
        if self.candidates.is_empty() {
            self.candidates.push(newcomer);
            return Verdict {
                state: BoxState::Accepted,
                superseded: Vec::new(),
            };
        }

        let grown = newcomer.expanded(self.margin);
        let mut is_valid = true;
        let mut superseded = Vec::new();

        for incumbent in &self.candidates {
            if !grown.overlaps(&incumbent.rect()) {
                continue;
            }
            if newcomer.area() > incumbent.area() {
                if self.rejected.insert(*incumbent) {
                    superseded.push(*incumbent);
                }
            } else {
                is_valid = false;
            }
        }

        let state = if is_valid {
            if !self.candidates.contains(&newcomer) {
                self.candidates.push(newcomer);
            }
            BoxState::Accepted
        } else {
            BoxState::Rejected
        };

        Verdict { state, superseded }
    }

    /// Ends the pass: every superseded box is dropped, re-added or not.
    pub fn finish(self) -> Vec<BoundingBox> {
        let rejected = self.rejected;
        self.candidates
            .into_iter()
            .filter(|candidate| !rejected.contains(candidate))
            .collect()
    }

    /// State of a box as seen from the current point of the pass.
    pub fn state_of(&self, bounding_box: &BoundingBox) -> BoxState {
        if self.rejected.contains(bounding_box) {
            BoxState::Superseded
        } else if self.candidates.contains(bounding_box) {
            BoxState::Accepted
        } else {
            BoxState::Pending
        }
    }
}

/// True when a box is neither too small nor too large to be a slice.
pub fn has_slice_dimensions(bounding_box: &BoundingBox, config: &SlicerConfig) -> bool {
    let too_small = bounding_box.width < config.min_dimension || bounding_box.height < config.min_dimension;
    let too_large = bounding_box.width > config.max_dimension || bounding_box.height > config.max_dimension;
    !too_small && !too_large
}

/// Filters and deduplicates contour boxes into the final set of slice regions.
/// The returned boxes are in acceptance order; callers that need a stable
/// spatial order sort them themselves.
pub fn validate_and_dedupe(boxes: &[BoundingBox], config: &SlicerConfig) -> Vec<BoundingBox> {
    let mut ordered: Vec<BoundingBox> = boxes
        .iter()
        .copied()
        .filter(|bounding_box| has_slice_dimensions(bounding_box, config))
        .collect();

    if config.dedupe_policy == DedupePolicy::AreaDescending {
        ordered.sort_by_key(|bounding_box| Reverse(bounding_box.area()));
    }

    let mut candidate_set = CandidateSet::new(config.margin);
    for bounding_box in ordered {
        let verdict = candidate_set.offer(bounding_box);
        log::debug!(
            "box {:?} -> {:?} (superseded {})",
            bounding_box,
            verdict.state,
            verdict.superseded.len()
        );
    }
    candidate_set.finish()
}
