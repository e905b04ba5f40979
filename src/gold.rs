use alloc::vec::Vec;

use crate::action::Action;
use crate::arc_eager;
use crate::errors::{ParserError, Result};
use crate::sentence::Sentence;
use crate::state::State;

/// Annotated tree of a training sentence.
///
/// Heads are stored by sentence position, with the root at its actual
/// position (`0` or `n + 1`).
#[derive(Clone, Debug)]
pub struct GoldConfiguration {
    arcs: Vec<Option<(usize, u32)>>,
    children: Vec<Vec<usize>>,
    root: usize,
    partial: bool,
    non_projective: bool,
}

impl GoldConfiguration {
    /// Creates a gold tree.
    ///
    /// # Arguments
    ///
    /// * `sentence` - The annotated sentence.
    /// * `heads` - One `(head, label)` pair per word. Heads follow the CoNLL
    ///   convention: words are numbered from `1` and `0` stands for the root.
    ///   `None` marks a word without annotation.
    ///
    /// # Errors
    ///
    /// The number of heads must match the sentence length, and every head must
    /// be `0` or a word position other than the word itself.
    pub fn new(sentence: &Sentence, heads: &[Option<(usize, u32)>]) -> Result<Self> {
        let n = sentence.len();
        if heads.len() != n {
            return Err(ParserError::invalid_argument(format!(
                "expected {n} gold heads, got {}",
                heads.len()
            )));
        }
        let root = sentence.root();
        let mut arcs = vec![None; sentence.n_positions()];
        let mut children = vec![vec![]; sentence.n_positions()];
        for (i, &arc) in heads.iter().enumerate() {
            let dependent = i + 1;
            let Some((head, label)) = arc else {
                continue;
            };
            if head > n || head == dependent {
                return Err(ParserError::invalid_argument(format!(
                    "invalid head {head} of word {dependent}"
                )));
            }
            let head = if head == 0 { root } else { head };
            arcs[dependent] = Some((head, label));
            children[head].push(dependent);
        }
        let partial = arcs[1..=n].iter().any(Option::is_none);
        let non_projective = has_crossing_arcs(&arcs);
        Ok(Self {
            arcs,
            children,
            root,
            partial,
            non_projective,
        })
    }

    /// Gold head position of the token.
    #[inline(always)]
    pub fn head(&self, token: usize) -> Option<usize> {
        self.arcs.get(token).copied().flatten().map(|(head, _)| head)
    }

    /// Gold `(head, label)` pair of the token.
    #[inline(always)]
    pub fn arc(&self, token: usize) -> Option<(usize, u32)> {
        self.arcs.get(token).copied().flatten()
    }

    /// Gold dependents of the token in increasing order.
    #[inline(always)]
    pub fn children(&self, token: usize) -> &[usize] {
        &self.children[token]
    }

    /// Position of the root.
    #[inline(always)]
    pub const fn root(&self) -> usize {
        self.root
    }

    /// Returns `true` if some word has no annotated head.
    #[inline(always)]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// Returns `true` if two annotated arcs cross.
    #[inline(always)]
    pub const fn is_non_projective(&self) -> bool {
        self.non_projective
    }

    /// Returns `true` if the token is the root or has an annotated head.
    #[inline(always)]
    pub fn is_anchored(&self, token: usize) -> bool {
        token == self.root || self.head(token).is_some()
    }

    /// Gold labels, one per word, in CoNLL numbering.
    pub fn tree(&self) -> Vec<Option<(usize, u32)>> {
        let n = self.arcs.len() - 2;
        (1..=n)
            .map(|token| {
                self.arc(token)
                    .map(|(head, label)| (if head == self.root { 0 } else { head }, label))
            })
            .collect()
    }

    /// Counts the reachable gold arcs that `action` would make unreachable.
    ///
    /// Returns `None` if the action is illegal in `state`.
    pub fn action_cost(&self, action: Action, state: &State) -> Option<usize> {
        if !arc_eager::can_do(action, state) {
            return None;
        }
        let cost = match action {
            Action::Shift => {
                let b = state.buffer_head()?;
                state
                    .stack()
                    .iter()
                    .filter(|&&k| {
                        self.head(b) == Some(k)
                            || (self.head(k) == Some(b) && !state.has_head(k))
                    })
                    .count()
            }
            Action::Reduce => {
                let s = state.peek()?;
                self.children_in_buffer(s, state)
            }
            Action::Unshift => 0,
            Action::LeftArc(label) => {
                let s = state.peek()?;
                let b = state.buffer_head()?;
                match self.arc(s) {
                    Some((head, gold_label)) if head == b => usize::from(gold_label != label),
                    gold => {
                        let head_in_buffer = gold.is_some_and(|(head, _)| {
                            head != b && in_buffer(head, state)
                        });
                        self.children_in_buffer(s, state) + usize::from(head_in_buffer)
                    }
                }
            }
            Action::RightArc(label) => {
                let s = state.peek()?;
                let b = state.buffer_head()?;
                match self.arc(b) {
                    Some((head, gold_label)) if head == s => usize::from(gold_label != label),
                    gold => {
                        let head_elsewhere = gold.is_some_and(|(head, _)| {
                            (head != s && state.stack().contains(&head))
                                || (head > b && in_buffer(head, state))
                        });
                        let stranded = state
                            .stack()
                            .iter()
                            .filter(|&&k| self.head(k) == Some(b) && !state.has_head(k))
                            .count();
                        stranded + usize::from(head_elsewhere)
                    }
                }
            }
        };
        Some(cost)
    }

    fn children_in_buffer(&self, token: usize, state: &State) -> usize {
        self.children[token]
            .iter()
            .filter(|&&child| in_buffer(child, state))
            .count()
    }
}

#[inline(always)]
fn in_buffer(token: usize, state: &State) -> bool {
    state
        .buffer_head()
        .is_some_and(|head| head <= token && token <= state.buffer_end())
}

/// Two arcs cross when exactly one endpoint of one arc lies strictly inside
/// the span of the other.
fn has_crossing_arcs(arcs: &[Option<(usize, u32)>]) -> bool {
    let spans: Vec<(usize, usize)> = arcs
        .iter()
        .enumerate()
        .filter_map(|(dependent, arc)| {
            arc.map(|(head, _)| (dependent.min(head), dependent.max(head)))
        })
        .collect();
    spans.iter().enumerate().any(|(i, &(l1, r1))| {
        spans[i + 1..]
            .iter()
            .any(|&(l2, r2)| (l1 < l2 && l2 < r1 && r1 < r2) || (l2 < l1 && l1 < r2 && r2 < r1))
    })
}
