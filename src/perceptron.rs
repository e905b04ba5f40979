use alloc::vec::Vec;

use bincode::{Decode, Encode};
use hashbrown::HashMap;

use crate::action::Action;
use crate::feature::FeatureKey;
use crate::vector::{AveragedValue, CompactArray, WeightKind, WeightStats, WeightTables};

/// Scores the transitions of a configuration from its features.
pub trait ActionScorer: Sync {
    /// Number of dependency labels.
    fn n_labels(&self) -> u32;

    /// Score of the shift transition.
    fn shift_score(&self, features: &[Option<FeatureKey>]) -> f64;

    /// Score of the reduce transition.
    fn reduce_score(&self, features: &[Option<FeatureKey>]) -> f64;

    /// Scores of the right-arc transition, indexed by label.
    fn right_arc_scores(&self, features: &[Option<FeatureKey>]) -> Vec<f64>;

    /// Scores of the left-arc transition, indexed by label.
    fn left_arc_scores(&self, features: &[Option<FeatureKey>]) -> Vec<f64>;

    /// Score of a single action. Unshift always scores `0`.
    fn action_score(&self, action: Action, features: &[Option<FeatureKey>]) -> f64 {
        let label_score = |scores: Vec<f64>, label: u32| {
            usize::try_from(label)
                .ok()
                .and_then(|l| scores.get(l).copied())
                .unwrap_or(0.0)
        };
        match action {
            Action::Shift => self.shift_score(features),
            Action::Reduce => self.reduce_score(features),
            Action::Unshift => 0.0,
            Action::RightArc(label) => label_score(self.right_arc_scores(features), label),
            Action::LeftArc(label) => label_score(self.left_arc_scores(features), label),
        }
    }
}

/// Read-only view of a classifier's weights.
///
/// The view borrows the classifier, so weights cannot change while it is
/// alive.
#[derive(Clone, Copy, Debug)]
pub struct Scorer<'a> {
    tables: &'a WeightTables,
    n_labels: u32,
    iteration: u32,
    kind: WeightKind,
}

impl Scorer<'_> {
    #[inline(always)]
    fn scalar_score(
        &self,
        tables: &[HashMap<FeatureKey, AveragedValue>],
        features: &[Option<FeatureKey>],
    ) -> f64 {
        let mut score = 0.0;
        for (table, feature) in tables.iter().zip(features) {
            if let Some(value) = feature.and_then(|key| table.get(&key)) {
                score += value.get(self.kind, self.iteration);
            }
        }
        score
    }

    #[inline(always)]
    fn label_scores(
        &self,
        tables: &[HashMap<FeatureKey, CompactArray>],
        features: &[Option<FeatureKey>],
    ) -> Vec<f64> {
        let mut scores = vec![0.0; usize::try_from(self.n_labels).unwrap_or(0)];
        for (table, feature) in tables.iter().zip(features) {
            if let Some(array) = feature.and_then(|key| table.get(&key)) {
                array.add_to(&mut scores, self.kind, self.iteration);
            }
        }
        scores
    }
}

impl ActionScorer for Scorer<'_> {
    fn n_labels(&self) -> u32 {
        self.n_labels
    }

    fn shift_score(&self, features: &[Option<FeatureKey>]) -> f64 {
        self.scalar_score(&self.tables.shift, features)
    }

    fn reduce_score(&self, features: &[Option<FeatureKey>]) -> f64 {
        self.scalar_score(&self.tables.reduce, features)
    }

    fn right_arc_scores(&self, features: &[Option<FeatureKey>]) -> Vec<f64> {
        self.label_scores(&self.tables.right_arc, features)
    }

    fn left_arc_scores(&self, features: &[Option<FeatureKey>]) -> Vec<f64> {
        self.label_scores(&self.tables.left_arc, features)
    }
}

/// A linear model over transition features that learns online.
pub trait Classifier {
    /// Adds `change` to the weight of `(action, slot, key)` at the current
    /// iteration. Unshift has no weight and is ignored.
    fn change_weight(&mut self, action: Action, slot: usize, key: FeatureKey, change: f64);

    /// Current iteration, starting from `1`.
    fn iteration(&self) -> u32;

    /// Advances the iteration counter.
    fn increment_iteration(&mut self);

    /// Returns a scoring view of the weights.
    fn scorer(&self, kind: WeightKind) -> Scorer<'_>;
}

/// Multi-class averaged perceptron over the transitions.
#[derive(Clone, Debug, PartialEq, Decode, Encode)]
pub struct AveragedPerceptron {
    tables: WeightTables,
    n_labels: u32,
    iteration: u32,
}

impl AveragedPerceptron {
    /// Creates a model with all weights set to zero.
    pub fn new(n_slots: usize, n_labels: u32) -> Self {
        Self {
            tables: WeightTables::new(n_slots),
            n_labels,
            iteration: 1,
        }
    }

    /// Weight tables.
    #[inline(always)]
    pub const fn tables(&self) -> &WeightTables {
        &self.tables
    }

    /// Number of dependency labels.
    #[inline(always)]
    pub const fn n_labels(&self) -> u32 {
        self.n_labels
    }

    /// Number of feature slots.
    #[inline(always)]
    pub fn n_slots(&self) -> usize {
        self.tables.n_slots()
    }

    /// Size statistics of the arc weights.
    pub fn stats(&self) -> WeightStats {
        self.tables.stats(self.iteration)
    }
}

impl Classifier for AveragedPerceptron {
    fn change_weight(&mut self, action: Action, slot: usize, key: FeatureKey, change: f64) {
        let iteration = self.iteration;
        let tables = &mut self.tables;
        match action {
            Action::Shift => {
                if let Some(table) = tables.shift.get_mut(slot) {
                    table.entry(key).or_default().update(change, iteration);
                }
            }
            Action::Reduce => {
                if let Some(table) = tables.reduce.get_mut(slot) {
                    table.entry(key).or_default().update(change, iteration);
                }
            }
            Action::RightArc(label) => {
                if let Some(table) = tables.right_arc.get_mut(slot) {
                    table
                        .entry(key)
                        .or_insert_with(|| CompactArray::new(label))
                        .entry(label)
                        .update(change, iteration);
                }
            }
            Action::LeftArc(label) => {
                if let Some(table) = tables.left_arc.get_mut(slot) {
                    table
                        .entry(key)
                        .or_insert_with(|| CompactArray::new(label))
                        .entry(label)
                        .update(change, iteration);
                }
            }
            Action::Unshift => (),
        }
    }

    #[inline(always)]
    fn iteration(&self) -> u32 {
        self.iteration
    }

    #[inline(always)]
    fn increment_iteration(&mut self) {
        self.iteration += 1;
    }

    fn scorer(&self, kind: WeightKind) -> Scorer<'_> {
        Scorer {
            tables: &self.tables,
            n_labels: self.n_labels,
            iteration: self.iteration,
            kind,
        }
    }
}

/// Sign classifier telling whether a transition stays on a gold derivation.
///
/// It shares the weight layout of [`AveragedPerceptron`] and is trained with
/// unit corrections.
#[derive(Clone, Debug, PartialEq, Decode, Encode)]
pub struct BinaryPerceptron(AveragedPerceptron);

impl BinaryPerceptron {
    /// Creates a classifier with all weights set to zero.
    pub fn new(n_slots: usize, n_labels: u32) -> Self {
        Self(AveragedPerceptron::new(n_slots, n_labels))
    }

    /// Returns `true` if `action` is predicted to keep the derivation on a
    /// gold path, i.e., its averaged score is not negative.
    pub fn predicts_oracle(&self, action: Action, features: &[Option<FeatureKey>]) -> bool {
        self.0
            .scorer(WeightKind::Averaged)
            .action_score(action, features)
            >= 0.0
    }

    /// Moves the weights of every present feature of `action` by `+1` if
    /// the action is an oracle transition and by `-1` otherwise.
    pub fn correct(&mut self, action: Action, features: &[Option<FeatureKey>], is_oracle: bool) {
        let change = if is_oracle { 1.0 } else { -1.0 };
        for (slot, feature) in features.iter().enumerate() {
            if let Some(key) = *feature {
                self.0.change_weight(action, slot, key, change);
            }
        }
    }

    /// Underlying weights.
    #[inline(always)]
    pub const fn model(&self) -> &AveragedPerceptron {
        &self.0
    }
}

impl Classifier for BinaryPerceptron {
    fn change_weight(&mut self, action: Action, slot: usize, key: FeatureKey, change: f64) {
        self.0.change_weight(action, slot, key, change);
    }

    fn iteration(&self) -> u32 {
        self.0.iteration()
    }

    fn increment_iteration(&mut self) {
        self.0.increment_iteration();
    }

    fn scorer(&self, kind: WeightKind) -> Scorer<'_> {
        self.0.scorer(kind)
    }
}
