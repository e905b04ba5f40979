use core::hash::{Hash, Hasher};

use alloc::vec::Vec;

use crate::action::Action;
use crate::arc_eager;
use crate::sentence::Sentence;
use crate::state::State;

/// A parser state together with the actions that produced it and their
/// cumulative score.
///
/// Two configurations are equal when their scores and action histories are
/// equal.
#[derive(Clone, Debug)]
pub struct Configuration {
    state: State,
    actions: Vec<Action>,
    score: f64,
}

impl Configuration {
    /// Creates the initial configuration of the sentence.
    pub fn new(sentence: &Sentence) -> Self {
        Self {
            state: State::new(sentence),
            actions: vec![],
            score: 0.0,
        }
    }

    /// Rebuilds a configuration by applying `actions` to the initial
    /// configuration of the sentence. The score is `0`.
    ///
    /// # Panics
    ///
    /// Panics if one of the actions is illegal.
    pub fn replay(sentence: &Sentence, actions: &[Action]) -> Self {
        let mut config = Self::new(sentence);
        for &action in actions {
            config.apply(action);
        }
        config
    }

    /// Parser state.
    #[inline(always)]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Actions applied so far.
    #[inline(always)]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Cumulative score.
    #[inline(always)]
    pub const fn score(&self) -> f64 {
        self.score
    }

    #[inline(always)]
    pub(crate) fn set_score(&mut self, score: f64) {
        self.score = score;
    }

    /// Returns `true` if the parse is complete.
    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        arc_eager::is_terminal(&self.state)
    }

    /// Applies `action` and appends it to the history. The score is left
    /// untouched.
    ///
    /// # Panics
    ///
    /// Panics if the action is illegal.
    pub fn apply(&mut self, action: Action) {
        arc_eager::apply(action, &mut self.state);
        self.actions.push(action);
    }

    /// Returns a copy extended with `action`, carrying the given cumulative
    /// score.
    pub fn with_action(&self, action: Action, score: f64) -> Self {
        let mut next = self.clone();
        next.apply(action);
        next.score = score;
        next
    }

    /// Returns the `(head, label)` pair of every word in order. The root is
    /// reported as head `0`.
    pub fn tree(&self) -> Vec<Option<(usize, u32)>> {
        let root = self.state.root();
        (1..=self.state.n_words())
            .map(|token| {
                self.state
                    .arc(token)
                    .map(|(head, label)| (if head == root { 0 } else { head }, label))
            })
            .collect()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.score.to_bits() == other.score.to_bits() && self.actions == other.actions
    }
}

impl Eq for Configuration {}

impl Hash for Configuration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.score.to_bits().hash(state);
        self.actions.hash(state);
    }
}
