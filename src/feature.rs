use alloc::vec::Vec;

use crate::sentence::Sentence;
use crate::state::State;

/// Opaque feature identifier.
pub type FeatureKey = u64;

/// Converts a parser state into a fixed-length vector of feature keys.
///
/// Entry `i` of the returned vector is the feature of slot `i`. `None`
/// entries are skipped when scoring.
pub trait FeatureExtractor: Sync {
    /// Number of feature slots.
    fn n_slots(&self) -> usize;

    /// Extracts the features of `state`.
    ///
    /// The returned vector must have exactly [`Self::n_slots()`] entries.
    fn extract(&self, sentence: &Sentence, state: &State) -> Vec<Option<FeatureKey>>;
}

#[inline(always)]
fn mix(h: u64, x: u64) -> u64 {
    (h.rotate_left(5) ^ x).wrapping_mul(0x517c_c1b7_2722_0a95)
}

/// Packs a template ID and its atoms into a single key.
#[inline(always)]
fn key(template: u64, atoms: &[u64]) -> FeatureKey {
    atoms.iter().fold(mix(0, template), |h, &x| mix(h, x))
}

/// Word and tag of a position, `None` if the position is empty.
#[inline(always)]
fn word(sentence: &Sentence, position: Option<usize>) -> Option<u64> {
    sentence.token(position?).map(|t| u64::from(t.word))
}

#[inline(always)]
fn tag(sentence: &Sentence, position: Option<usize>) -> Option<u64> {
    sentence.token(position?).map(|t| u64::from(t.tag))
}

macro_rules! template {
    ( $id:expr; $($atom:expr),+ ) => {
        (|| Some(key($id, &[$($atom?),+])))()
    };
}

/// Word, tag, valence, distance, and label templates over the two topmost
/// stack elements, the first three buffer elements, and their children.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicFeatureExtractor;

impl BasicFeatureExtractor {
    /// Creates a new extractor.
    pub const fn new() -> Self {
        Self
    }
}

const N_SLOTS: usize = 26;

impl FeatureExtractor for BasicFeatureExtractor {
    fn n_slots(&self) -> usize {
        N_SLOTS
    }

    fn extract(&self, sentence: &Sentence, state: &State) -> Vec<Option<FeatureKey>> {
        let s0 = state.peek();
        let s1 = state.stack_at(1);
        let b0 = state.buffer_head();
        let b1 = state.buffer_at(1);
        let b2 = state.buffer_at(2);
        let s0h = s0.and_then(|s| state.head(s));
        let s0l = s0.and_then(|s| state.leftmost_child(s));
        let s0r = s0.and_then(|s| state.rightmost_child(s));
        let b0l = b0.and_then(|b| state.leftmost_child(b));

        let s0w = word(sentence, s0);
        let s0t = tag(sentence, s0);
        let b0w = word(sentence, b0);
        let b0t = tag(sentence, b0);
        let b1w = word(sentence, b1);
        let b1t = tag(sentence, b1);
        let b2t = tag(sentence, b2);
        let s1t = tag(sentence, s1);
        let label = |p: Option<usize>| p.and_then(|p| state.label(p)).map(u64::from);
        let distance = match (s0, b0) {
            (Some(s), Some(b)) => Some(u64::try_from(s.abs_diff(b).min(5)).unwrap_or(5)),
            _ => None,
        };
        let s0_left = s0.map(|s| u64::from(state.left_valency(s)));
        let s0_right = s0.map(|s| u64::from(state.right_valency(s)));
        let b0_left = b0.map(|b| u64::from(state.left_valency(b)));

        let features = vec![
            template!(0; s0w),
            template!(1; s0t),
            template!(2; s0w, s0t),
            template!(3; b0w),
            template!(4; b0t),
            template!(5; b0w, b0t),
            template!(6; b1w),
            template!(7; b1t),
            template!(8; b1w, b1t),
            template!(9; b2t),
            template!(10; s0w, b0w),
            template!(11; s0t, b0t),
            template!(12; s0w, s0t, b0t),
            template!(13; s0t, b0w, b0t),
            template!(14; b0t, b1t, b2t),
            template!(15; s0t, b0t, b1t),
            template!(16; s1t, s0t, b0t),
            template!(17; tag(sentence, s0h), s0t, b0t),
            template!(18; s0t, tag(sentence, s0l), b0t),
            template!(19; s0t, tag(sentence, s0r), b0t),
            template!(20; s0t, b0t, tag(sentence, b0l)),
            template!(21; s0w, b0w, distance),
            template!(22; s0w, s0_left, s0_right),
            template!(23; b0w, b0_left),
            template!(24; s0w, label(s0), label(s0l), label(s0r)),
            template!(25; b0t, label(b0l), Some(u64::from(state.empty_flag()))),
        ];
        debug_assert_eq!(N_SLOTS, features.len());
        features
    }
}
