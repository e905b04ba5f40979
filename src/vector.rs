use alloc::vec::Vec;

use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};
use hashbrown::HashMap;

use crate::feature::FeatureKey;

/// Which of the two weights kept per feature is read.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Decode, Encode)]
pub enum WeightKind {
    /// The current perceptron weight.
    Live,

    /// The time-averaged weight.
    Averaged,
}

/// A live weight together with the sum of `iteration * change` over all of
/// its updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Decode, Encode)]
pub struct AveragedValue {
    value: f64,
    acc: f64,
}

impl AveragedValue {
    /// Adds `change` to the weight at the given iteration.
    #[inline(always)]
    pub fn update(&mut self, change: f64, iteration: u32) {
        self.value += change;
        self.acc += f64::from(iteration) * change;
    }

    /// Live weight.
    #[inline(always)]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Accumulated `iteration * change`.
    #[inline(always)]
    pub const fn acc(&self) -> f64 {
        self.acc
    }

    /// Weight averaged over `iteration` iterations.
    #[inline(always)]
    pub fn averaged(&self, iteration: u32) -> f64 {
        self.value - self.acc / f64::from(iteration)
    }

    /// Reads the weight of the given kind.
    #[inline(always)]
    pub fn get(&self, kind: WeightKind, iteration: u32) -> f64 {
        match kind {
            WeightKind::Live => self.value,
            WeightKind::Averaged => self.averaged(iteration),
        }
    }
}

/// Dense per-label weights covering `offset..offset + len`.
#[derive(Clone, Debug, Default, PartialEq, Decode, Encode)]
pub struct CompactArray {
    offset: u32,
    values: Vec<AveragedValue>,
}

impl CompactArray {
    /// Creates an array holding a single label.
    pub fn new(label: u32) -> Self {
        Self {
            offset: label,
            values: vec![AveragedValue::default()],
        }
    }

    /// First covered label.
    #[inline(always)]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Number of covered labels.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no label is covered.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the weight of `label` if it is covered.
    #[inline(always)]
    pub fn get(&self, label: u32) -> Option<&AveragedValue> {
        let idx = usize::try_from(label.checked_sub(self.offset)?).ok()?;
        self.values.get(idx)
    }

    /// Returns the weight of `label`, growing the array to cover it.
    pub fn entry(&mut self, label: u32) -> &mut AveragedValue {
        if label < self.offset {
            let n_new = usize::try_from(self.offset - label).unwrap_or(0);
            self.values
                .splice(0..0, core::iter::repeat(AveragedValue::default()).take(n_new));
            self.offset = label;
        }
        let idx = usize::try_from(label - self.offset).unwrap_or(0);
        if idx >= self.values.len() {
            self.values.resize(idx + 1, AveragedValue::default());
        }
        &mut self.values[idx]
    }

    /// Adds the weights to `scores`, indexed by label.
    #[inline(always)]
    pub fn add_to(&self, scores: &mut [f64], kind: WeightKind, iteration: u32) {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX);
        for (score, value) in scores.iter_mut().skip(start).zip(&self.values) {
            *score += value.get(kind, iteration);
        }
    }

    /// Iterates over `(label, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &AveragedValue)> {
        (self.offset..).zip(&self.values)
    }
}

/// Weight tables of the four scored transitions, one map per feature slot.
///
/// Shift and reduce keep one weight per feature. Right-arc and left-arc keep
/// one [`CompactArray`] per feature, indexed by label. Unshift has no weight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightTables {
    pub(crate) shift: Vec<HashMap<FeatureKey, AveragedValue>>,
    pub(crate) reduce: Vec<HashMap<FeatureKey, AveragedValue>>,
    pub(crate) right_arc: Vec<HashMap<FeatureKey, CompactArray>>,
    pub(crate) left_arc: Vec<HashMap<FeatureKey, CompactArray>>,
}

impl WeightTables {
    /// Creates empty tables for `n_slots` feature slots.
    pub fn new(n_slots: usize) -> Self {
        Self {
            shift: vec![HashMap::new(); n_slots],
            reduce: vec![HashMap::new(); n_slots],
            right_arc: vec![HashMap::new(); n_slots],
            left_arc: vec![HashMap::new(); n_slots],
        }
    }

    /// Number of feature slots.
    #[inline(always)]
    pub fn n_slots(&self) -> usize {
        self.shift.len()
    }

    /// Counts stored arc weights and the non-zero ones among their averages.
    pub fn stats(&self, iteration: u32) -> WeightStats {
        let mut stats = WeightStats::default();
        let count = |tables: &[HashMap<FeatureKey, CompactArray>]| {
            let mut total = 0;
            let mut non_zero = 0;
            for array in tables.iter().flat_map(HashMap::values) {
                total += array.len();
                non_zero += array
                    .iter()
                    .filter(|(_, v)| v.averaged(iteration) != 0.0)
                    .count();
            }
            (total, non_zero)
        };
        let (right, right_non_zero) = count(&self.right_arc);
        let (left, left_non_zero) = count(&self.left_arc);
        stats.right_arc_weights = right;
        stats.left_arc_weights = left;
        stats.non_zero_averaged = right_non_zero + left_non_zero;
        stats
    }
}

/// Size statistics of [`WeightTables`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WeightStats {
    /// Number of stored right-arc weights.
    pub right_arc_weights: usize,

    /// Number of stored left-arc weights.
    pub left_arc_weights: usize,

    /// Number of arc weights whose averaged value is not zero.
    pub non_zero_averaged: usize,
}

fn flatten<V: Clone>(tables: &[HashMap<FeatureKey, V>]) -> Vec<Vec<(FeatureKey, V)>> {
    tables
        .iter()
        .map(|hm| {
            let mut v: Vec<_> = hm.iter().map(|(&k, v)| (k, v.clone())).collect();
            v.sort_unstable_by_key(|&(k, _)| k);
            v
        })
        .collect()
}

fn unflatten<V>(tables: Vec<Vec<(FeatureKey, V)>>) -> Vec<HashMap<FeatureKey, V>> {
    tables
        .into_iter()
        .map(|v| v.into_iter().collect())
        .collect()
}

impl<Context> Decode<Context> for WeightTables {
    #[allow(clippy::type_complexity)]
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let shift: Vec<Vec<(FeatureKey, AveragedValue)>> = Decode::decode(decoder)?;
        let reduce: Vec<Vec<(FeatureKey, AveragedValue)>> = Decode::decode(decoder)?;
        let right_arc: Vec<Vec<(FeatureKey, CompactArray)>> = Decode::decode(decoder)?;
        let left_arc: Vec<Vec<(FeatureKey, CompactArray)>> = Decode::decode(decoder)?;
        Ok(Self {
            shift: unflatten(shift),
            reduce: unflatten(reduce),
            right_arc: unflatten(right_arc),
            left_arc: unflatten(left_arc),
        })
    }
}
bincode::impl_borrow_decode!(WeightTables);

impl Encode for WeightTables {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        Encode::encode(&flatten(&self.shift), encoder)?;
        Encode::encode(&flatten(&self.reduce), encoder)?;
        Encode::encode(&flatten(&self.right_arc), encoder)?;
        Encode::encode(&flatten(&self.left_arc), encoder)?;
        Ok(())
    }
}
