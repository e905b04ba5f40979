use core::cmp::Ordering;
use std::collections::BTreeSet;
use std::thread;

use alloc::vec::Vec;

use crate::action::Action;
use crate::arc_eager;
use crate::configuration::Configuration;
use crate::errors::{ParserError, Result};
use crate::feature::FeatureExtractor;
use crate::perceptron::ActionScorer;
use crate::sentence::Sentence;
use crate::state::State;

/// A scored candidate of the next beam.
///
/// Candidates are ordered by score, then by beam slot (lower wins), then by
/// action (earlier variant and smaller label wins). A candidate with no
/// action carries a terminal configuration over unchanged.
#[derive(Clone, Copy, Debug)]
pub struct BeamElement {
    /// Cumulative score after applying the action.
    pub score: f64,

    /// Index of the parent configuration in the current beam.
    pub slot: usize,

    /// Action to apply to the parent.
    pub action: Option<Action>,
}

impl Ord for BeamElement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.slot.cmp(&self.slot))
            .then_with(|| other.action.cmp(&self.action))
    }
}

impl PartialOrd for BeamElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BeamElement {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BeamElement {}

/// Ordered set holding at most `width` best candidates.
#[derive(Debug)]
pub struct BoundedBeam {
    elements: BTreeSet<BeamElement>,
    width: usize,
}

impl BoundedBeam {
    /// Creates an empty set.
    pub const fn new(width: usize) -> Self {
        Self {
            elements: BTreeSet::new(),
            width,
        }
    }

    /// Inserts a candidate, evicting the worst one if the set overflows.
    pub fn insert(&mut self, element: BeamElement) {
        self.elements.insert(element);
        if self.elements.len() > self.width {
            self.elements.pop_first();
        }
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if there is no candidate.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the candidates, best first.
    pub fn into_sorted(self) -> Vec<BeamElement> {
        self.elements.into_iter().rev().collect()
    }
}

/// A configuration of the next beam with the slot of its parent.
#[derive(Clone, Debug)]
pub struct Successor {
    /// Index of the parent in the previous beam.
    pub parent: usize,

    /// The new configuration.
    pub config: Configuration,
}

impl Successor {
    /// Returns the action that produced this successor, or `None` if the
    /// parent was terminal and carried over.
    pub fn action(&self, beam: &[Configuration]) -> Option<Action> {
        let parent_len = beam[self.parent].actions().len();
        self.config.actions().get(parent_len).copied()
    }
}

/// Returns `true` if every configuration of the beam is terminal.
pub fn is_terminal(beam: &[Configuration]) -> bool {
    beam.iter().all(Configuration::is_terminal)
}

/// One step of beam search over a sentence.
pub struct BeamSearch<'a, F, S> {
    sentence: &'a Sentence,
    extractor: &'a F,
    scorer: &'a S,
    width: usize,
    n_threads: usize,
}

impl<'a, F, S> BeamSearch<'a, F, S>
where
    F: FeatureExtractor,
    S: ActionScorer,
{
    /// Creates a search.
    ///
    /// # Errors
    ///
    /// `width` and `n_threads` must not be 0.
    pub fn new(
        sentence: &'a Sentence,
        extractor: &'a F,
        scorer: &'a S,
        width: usize,
        n_threads: usize,
    ) -> Result<Self> {
        if width == 0 {
            return Err(ParserError::invalid_argument("beam_width must not be 0"));
        }
        if n_threads == 0 {
            return Err(ParserError::invalid_argument("n_threads must not be 0"));
        }
        Ok(Self {
            sentence,
            extractor,
            scorer,
            width,
            n_threads,
        })
    }

    /// Scores every allowed transition of one configuration.
    ///
    /// Unshift is proposed only when no other transition is allowed.
    fn candidates<P>(&self, slot: usize, config: &Configuration, allow: &P) -> Vec<BeamElement>
    where
        P: Fn(&State, Action) -> bool,
    {
        let prev = config.score();
        if config.is_terminal() {
            return vec![BeamElement {
                score: prev,
                slot,
                action: None,
            }];
        }
        let state = config.state();
        let features = self.extractor.extract(self.sentence, state);
        let mut elements = vec![];
        let mut push = |score: f64, action: Action| {
            elements.push(BeamElement {
                score: prev + score,
                slot,
                action: Some(action),
            });
        };
        if arc_eager::can_shift(state) && allow(state, Action::Shift) {
            push(self.scorer.shift_score(&features), Action::Shift);
        }
        if arc_eager::can_reduce(state) && allow(state, Action::Reduce) {
            push(self.scorer.reduce_score(&features), Action::Reduce);
        }
        if arc_eager::can_right_arc(state) {
            let scores = self.scorer.right_arc_scores(&features);
            for (label, score) in (0..).zip(scores) {
                if allow(state, Action::RightArc(label)) {
                    push(score, Action::RightArc(label));
                }
            }
        }
        if arc_eager::can_left_arc(state) {
            let scores = self.scorer.left_arc_scores(&features);
            for (label, score) in (0..).zip(scores) {
                if allow(state, Action::LeftArc(label)) {
                    push(score, Action::LeftArc(label));
                }
            }
        }
        if elements.is_empty() && arc_eager::can_unshift(state) && allow(state, Action::Unshift) {
            elements.push(BeamElement {
                score: prev + self.scorer.action_score(Action::Unshift, &features),
                slot,
                action: Some(Action::Unshift),
            });
        }
        elements
    }

    /// Expands the beam with all legal transitions and keeps the best
    /// `width` results, best first.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::Worker`] if a scoring worker fails.
    pub fn step(&self, beam: &[Configuration]) -> Result<Vec<Successor>> {
        self.step_with(beam, |_, _| true)
    }

    /// Same as [`Self::step()`], considering only transitions accepted by
    /// `allow`.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::Worker`] if a scoring worker fails.
    pub fn step_with<P>(&self, beam: &[Configuration], allow: P) -> Result<Vec<Successor>>
    where
        P: Fn(&State, Action) -> bool + Sync,
    {
        let mut bounded = BoundedBeam::new(self.width);
        if self.n_threads == 1 || beam.len() <= 1 {
            for (slot, config) in beam.iter().enumerate() {
                for element in self.candidates(slot, config, &allow) {
                    bounded.insert(element);
                }
            }
        } else {
            self.expand_parallel(beam, &allow, &mut bounded)?;
        }
        Ok(bounded
            .into_sorted()
            .into_iter()
            .map(|element| {
                let parent = &beam[element.slot];
                let config = match element.action {
                    Some(action) => parent.with_action(action, element.score),
                    None => parent.clone(),
                };
                Successor {
                    parent: element.slot,
                    config,
                }
            })
            .collect())
    }

    fn expand_parallel<P>(
        &self,
        beam: &[Configuration],
        allow: &P,
        bounded: &mut BoundedBeam,
    ) -> Result<()>
    where
        P: Fn(&State, Action) -> bool + Sync,
    {
        let (job_s, job_r) = crossbeam_channel::unbounded();
        for slot in 0..beam.len() {
            job_s.send(slot).map_err(|_| ParserError::worker(slot))?;
        }
        drop(job_s);
        let (result_s, result_r) = crossbeam_channel::unbounded();
        let mut received = vec![false; beam.len()];
        let panicked = thread::scope(|scope| {
            let mut threads = vec![];
            for _ in 0..self.n_threads.min(beam.len()) {
                let job_r = job_r.clone();
                let result_s = result_s.clone();
                threads.push(scope.spawn(move || {
                    while let Ok(slot) = job_r.recv() {
                        let elements = self.candidates(slot, &beam[slot], allow);
                        if result_s.send((slot, elements)).is_err() {
                            break;
                        }
                    }
                }));
            }
            drop(result_s);
            for (slot, elements) in result_r.iter() {
                received[slot] = true;
                for element in elements {
                    bounded.insert(element);
                }
            }
            threads
                .into_iter()
                .map(|t| t.join().is_err())
                .fold(false, |panicked, failed| panicked | failed)
        });
        if let Some(slot) = received.iter().position(|&r| !r) {
            return Err(ParserError::worker(slot));
        }
        if panicked {
            return Err(ParserError::worker(0));
        }
        Ok(())
    }
}
