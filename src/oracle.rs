//! Static and dynamic oracles tracking the gold derivations of a sentence.

use alloc::vec::Vec;

use log::debug;

use crate::action::Action;
use crate::arc_eager;
use crate::configuration::Configuration;
use crate::feature::FeatureExtractor;
use crate::gold::GoldConfiguration;
use crate::perceptron::ActionScorer;
use crate::sentence::Sentence;
use crate::state::State;

/// Configurations consistent with the gold tree, in generation order.
#[derive(Clone, Debug, Default)]
pub struct OracleSet {
    members: Vec<Configuration>,
}

impl OracleSet {
    /// Creates a set holding a single configuration.
    pub fn singleton(config: Configuration) -> Self {
        Self {
            members: vec![config],
        }
    }

    /// Adds a configuration unless an equal one is already present.
    pub fn insert(&mut self, config: Configuration) {
        if !self.contains(&config) {
            self.members.push(config);
        }
    }

    /// Returns `true` if an equal configuration is present.
    pub fn contains(&self, config: &Configuration) -> bool {
        self.members.iter().any(|member| member == config)
    }

    /// Number of configurations.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Configurations in generation order.
    pub fn members(&self) -> &[Configuration] {
        &self.members
    }

    /// Returns the highest-scoring member. Earlier members win ties.
    pub fn best(&self) -> Option<&Configuration> {
        let mut best: Option<&Configuration> = None;
        for member in &self.members {
            if best.map_or(true, |b| member.score() > b.score()) {
                best = Some(member);
            }
        }
        best
    }

    fn into_members(self) -> Vec<Configuration> {
        self.members
    }
}

/// Oracle of one gold tree, scoring its transitions with a model.
pub struct Oracle<'a, F, S> {
    sentence: &'a Sentence,
    gold: &'a GoldConfiguration,
    extractor: &'a F,
    scorer: &'a S,
}

impl<'a, F, S> Oracle<'a, F, S>
where
    F: FeatureExtractor,
    S: ActionScorer,
{
    /// Creates an oracle.
    pub const fn new(
        sentence: &'a Sentence,
        gold: &'a GoldConfiguration,
        extractor: &'a F,
        scorer: &'a S,
    ) -> Self {
        Self {
            sentence,
            gold,
            extractor,
            scorer,
        }
    }

    /// Returns the single gold transition of `state`.
    ///
    /// The transition may be illegal when the state has already left the
    /// derivation the rules follow.
    pub fn static_action(&self, state: &State) -> Action {
        let s = state.peek();
        let b = state.buffer_head();
        if let (Some(s), Some(b)) = (s, b) {
            if let Some((head, label)) = self.gold.arc(b) {
                if head == s {
                    return Action::RightArc(label);
                }
            }
            if let Some((head, label)) = self.gold.arc(s) {
                if head == b {
                    return Action::LeftArc(label);
                }
            }
        }
        if let Some(s) = s {
            if state.has_head(s) {
                let n_children = self.gold.children(s).len();
                if n_children == usize::try_from(state.valence(s)).unwrap_or(0) {
                    return Action::Reduce;
                }
                return Action::Shift;
            }
            if b.is_none() && state.stack_size() == 1 && s == state.root() {
                return Action::Reduce;
            }
        }
        Action::Shift
    }

    /// Zero-cost transitions of `state` in generation order: shift,
    /// right-arcs, left-arcs, reduce. Unshift is returned alone when it is
    /// the only legal transition.
    pub fn zero_cost_actions(&self, state: &State) -> Vec<Action> {
        let legal = arc_eager::legal_actions(state, self.scorer.n_labels());
        if legal.is_empty() && arc_eager::can_unshift(state) {
            return vec![Action::Unshift];
        }
        legal
            .into_iter()
            .filter(|&action| self.gold.action_cost(action, state) == Some(0))
            .collect()
    }

    fn successor(&self, config: &Configuration, action: Action) -> Configuration {
        let features = self.extractor.extract(self.sentence, config.state());
        let score = config.score() + self.scorer.action_score(action, &features);
        config.with_action(action, score)
    }

    /// Advances every oracle by its static transition. Terminal members are
    /// carried over. Members whose static transition is illegal are dropped.
    pub fn static_step(&self, oracles: &OracleSet) -> OracleSet {
        let mut next = OracleSet::default();
        for config in oracles.members() {
            if config.is_terminal() {
                next.insert(config.clone());
                continue;
            }
            let action = self.static_action(config.state());
            if arc_eager::can_do(action, config.state()) {
                next.insert(self.successor(config, action));
            } else {
                debug!("static oracle proposed illegal action {action}");
            }
        }
        next
    }

    /// Advances every oracle by all of its zero-cost transitions. Terminal
    /// members are carried over.
    pub fn dynamic_step(&self, oracles: &OracleSet) -> OracleSet {
        let mut next = OracleSet::default();
        for config in oracles.members() {
            if config.is_terminal() {
                next.insert(config.clone());
                continue;
            }
            let state = config.state();
            let actions = self.zero_cost_actions(state);
            if actions.is_empty() {
                continue;
            }
            let features = self.extractor.extract(self.sentence, state);
            let right_arc_scores = actions
                .iter()
                .any(|a| matches!(a, Action::RightArc(_)))
                .then(|| self.scorer.right_arc_scores(&features));
            let left_arc_scores = actions
                .iter()
                .any(|a| matches!(a, Action::LeftArc(_)))
                .then(|| self.scorer.left_arc_scores(&features));
            let label_score = |scores: &Option<Vec<f64>>, label: u32| {
                scores
                    .as_ref()
                    .and_then(|s| s.get(usize::try_from(label).ok()?).copied())
                    .unwrap_or(0.0)
            };
            for action in actions {
                let score = match action {
                    Action::Shift => self.scorer.shift_score(&features),
                    Action::Reduce => self.scorer.reduce_score(&features),
                    Action::RightArc(label) => label_score(&right_arc_scores, label),
                    Action::LeftArc(label) => label_score(&left_arc_scores, label),
                    Action::Unshift => self.scorer.action_score(Action::Unshift, &features),
                };
                next.insert(config.with_action(action, config.score() + score));
            }
        }
        next
    }
}

/// Reduces the oracle set after a beam step.
///
/// If the beam top is an oracle, the set collapses to it. Otherwise it
/// collapses to the member at `random_index` when given, or to `best`.
/// Returns the new set and its only member.
pub fn contract(
    oracles: OracleSet,
    beam_top: &Configuration,
    best: Configuration,
    random_index: Option<usize>,
) -> (OracleSet, Configuration) {
    let chosen = if oracles.contains(beam_top) {
        beam_top.clone()
    } else if let Some(idx) = random_index {
        oracles
            .into_members()
            .into_iter()
            .nth(idx)
            .unwrap_or(best)
    } else {
        best
    };
    (OracleSet::singleton(chosen.clone()), chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::perceptron::Classifier;
    use crate::test_utils;
    use crate::vector::WeightKind;

    #[test]
    fn test_static_derivation() {
        let (sentence, gold) = test_utils::abc(true);
        let extractor = test_utils::StateExtractor;
        let model = test_utils::empty_model(3);
        let scorer = model.scorer(WeightKind::Averaged);
        let oracle = Oracle::new(&sentence, &gold, &extractor, &scorer);

        let mut oracles = OracleSet::singleton(Configuration::new(&sentence));
        while !oracles.members().iter().all(Configuration::is_terminal) {
            oracles = oracle.static_step(&oracles);
            assert_eq!(1, oracles.len());
        }
        let config = &oracles.members()[0];
        assert_eq!(gold.tree(), config.tree());
        assert_eq!(
            &[
                Action::Shift,
                Action::LeftArc(0),
                Action::RightArc(1),
                Action::RightArc(2),
                Action::Reduce,
                Action::Reduce,
            ],
            config.actions(),
        );
    }

    #[test]
    fn test_static_derivation_root_last() {
        let (sentence, gold) = test_utils::abc(false);
        let extractor = test_utils::StateExtractor;
        let model = test_utils::empty_model(3);
        let scorer = model.scorer(WeightKind::Averaged);
        let oracle = Oracle::new(&sentence, &gold, &extractor, &scorer);

        let mut oracles = OracleSet::singleton(Configuration::new(&sentence));
        for _ in 0..20 {
            if oracles.members().iter().all(Configuration::is_terminal) {
                break;
            }
            oracles = oracle.static_step(&oracles);
            assert_eq!(1, oracles.len());
        }
        assert_eq!(gold.tree(), oracles.members()[0].tree());
    }

    #[test]
    fn test_dynamic_step_single() {
        // Every word attaches to the root.
        let sentence = test_utils::sentence(2, true);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 0)), Some((0, 0))]).unwrap();
        let extractor = test_utils::StateExtractor;
        let model = test_utils::empty_model(1);
        let scorer = model.scorer(WeightKind::Averaged);
        let oracle = Oracle::new(&sentence, &gold, &extractor, &scorer);

        let initial = OracleSet::singleton(Configuration::new(&sentence));
        let next = oracle.dynamic_step(&initial);
        assert_eq!(1, next.len());
        assert_eq!(&[Action::RightArc(0)], next.members()[0].actions());

        // Shifting word 2 or attaching it to word 1 loses its root arc.
        let next = oracle.dynamic_step(&next);
        assert_eq!(1, next.len());
        assert_eq!(Some(&Action::Reduce), next.members()[0].actions().last());
    }

    #[test]
    fn test_dynamic_step_multiple() {
        // A <- root, B <- C, C <- root: after attaching A, shifting B and
        // reducing A are both optimal.
        let sentence = test_utils::sentence(3, true);
        let gold =
            GoldConfiguration::new(&sentence, &[Some((0, 0)), Some((3, 0)), Some((0, 0))]).unwrap();
        let config = Configuration::replay(&sentence, &[Action::RightArc(0)]);
        assert_eq!(
            vec![Action::Shift, Action::Reduce],
            oracle_actions(&sentence, &gold, config.state()),
        );

        let extractor = test_utils::StateExtractor;
        let model = test_utils::empty_model(1);
        let scorer = model.scorer(WeightKind::Averaged);
        let oracle = Oracle::new(&sentence, &gold, &extractor, &scorer);
        let next = oracle.dynamic_step(&OracleSet::singleton(config));
        assert_eq!(2, next.len());

        // A <- B, B <- root, C <- root: after attaching B, only reducing it
        // keeps the root arc of C.
        let gold =
            GoldConfiguration::new(&sentence, &[Some((2, 0)), Some((0, 0)), Some((0, 0))]).unwrap();
        let config = Configuration::replay(
            &sentence,
            &[Action::Shift, Action::LeftArc(0), Action::RightArc(0)],
        );
        assert_eq!(
            vec![Action::Reduce],
            oracle_actions(&sentence, &gold, config.state()),
        );
    }

    #[test]
    fn test_unshift_oracle() {
        let sentence = test_utils::sentence(1, true);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 0))]).unwrap();
        let config = Configuration::replay(&sentence, &[Action::Shift]);
        assert_eq!(
            vec![Action::Unshift],
            oracle_actions(&sentence, &gold, config.state()),
        );
    }

    fn oracle_actions(sentence: &Sentence, gold: &GoldConfiguration, state: &State) -> Vec<Action> {
        let extractor = test_utils::StateExtractor;
        let model = test_utils::empty_model(1);
        let scorer = model.scorer(WeightKind::Averaged);
        Oracle::new(sentence, gold, &extractor, &scorer).zero_cost_actions(state)
    }

    #[test]
    fn test_best_scoring_oracle() {
        let sentence = test_utils::sentence(2, true);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 0)), Some((1, 1))]).unwrap();
        let extractor = test_utils::StateExtractor;
        let mut model = test_utils::empty_model(2);
        let initial = Configuration::new(&sentence);
        let features = extractor.extract(&sentence, initial.state());
        for (slot, feature) in features.iter().enumerate() {
            if let Some(key) = *feature {
                model.change_weight(Action::RightArc(0), slot, key, 1.0);
            }
        }
        model.increment_iteration();
        let scorer = model.scorer(WeightKind::Averaged);
        let oracle = Oracle::new(&sentence, &gold, &extractor, &scorer);
        let next = oracle.dynamic_step(&OracleSet::singleton(initial));
        let best = next.best().unwrap();
        assert_eq!(&[Action::RightArc(0)], best.actions());
        assert!(best.score() > 0.0);
    }

    #[test]
    fn test_contract() {
        let sentence = test_utils::sentence(2, true);
        let initial = Configuration::new(&sentence);
        let a = initial.with_action(Action::Shift, 1.0);
        let b = initial.with_action(Action::RightArc(0), 2.0);
        let c = initial.with_action(Action::RightArc(1), 0.5);
        let mut oracles = OracleSet::default();
        oracles.insert(a.clone());
        oracles.insert(b.clone());
        oracles.insert(a.clone());
        assert_eq!(2, oracles.len());
        assert_eq!(Some(&b), oracles.best());

        let (set, chosen) = contract(oracles.clone(), &a, b.clone(), None);
        assert_eq!(a, chosen);
        assert_eq!(1, set.len());

        let (_, chosen) = contract(oracles.clone(), &c, b.clone(), None);
        assert_eq!(b, chosen);

        let (set, chosen) = contract(oracles, &c, b, Some(0));
        assert_eq!(a, chosen);
        assert!(set.contains(&a));
    }
}
