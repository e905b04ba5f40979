use std::time::{Duration, Instant};

use alloc::vec::Vec;

use hashbrown::HashMap;
use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::action::Action;
use crate::beam::{self, BeamSearch, Successor};
use crate::configuration::Configuration;
use crate::errors::{ParserError, Result};
use crate::eval::{Accuracy, BinaryAccuracy, Evaluator};
use crate::feature::{FeatureExtractor, FeatureKey};
use crate::gold::GoldConfiguration;
use crate::options::{Options, UpdateMode};
use crate::oracle::{self, Oracle, OracleSet};
use crate::parser::BeamParser;
use crate::perceptron::{AveragedPerceptron, BinaryPerceptron, Classifier};
use crate::sentence::Sentence;
use crate::state::State;
use crate::vector::{WeightKind, WeightStats};

/// Result of training on one sentence.
#[cfg_attr(docsrs, doc(cfg(feature = "train")))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SentenceOutcome {
    /// The sentence has a partial tree and partial training has not started.
    Skipped,

    /// The weights were left unchanged.
    Unchanged {
        /// Number of beam steps.
        steps: usize,
    },

    /// The weights were updated.
    Updated {
        /// Number of beam steps.
        steps: usize,
    },
}

/// Summary of one pass over the training data.
#[cfg_attr(docsrs, doc(cfg(feature = "train")))]
#[derive(Clone, Debug)]
pub struct IterationStats {
    /// Pass number, starting from `1`.
    pub iteration: u32,

    /// Number of sentences trained on.
    pub n_trained: usize,

    /// Number of sentences that changed the weights.
    pub n_updated: usize,

    /// Number of skipped partial trees.
    pub n_skipped: usize,

    /// Time spent on training, excluding evaluation.
    pub elapsed: Duration,

    /// Size of the model after the pass.
    pub weights: WeightStats,

    /// Agreement of the auxiliary classifier with oracle membership during
    /// the pass, judged before each correction.
    pub binary: BinaryAccuracy,

    /// Accuracy on the development data, if given.
    pub dev: Option<Accuracy>,

    /// Agreement of the auxiliary classifier on the development data, if
    /// given.
    pub dev_binary: Option<BinaryAccuracy>,
}

/// Development data evaluated after every pass.
#[cfg_attr(docsrs, doc(cfg(feature = "train")))]
pub struct DevSet<'a> {
    /// Sentences with their gold trees.
    pub data: &'a [(Sentence, GoldConfiguration)],

    /// Evaluator of the predicted trees.
    pub evaluator: &'a Evaluator,
}

/// Trainer of the beam parser with the structured perceptron.
#[cfg_attr(docsrs, doc(cfg(feature = "train")))]
pub struct ArcEagerBeamTrainer<F> {
    options: Options,
    extractor: F,
    classifier: AveragedPerceptron,
    binary: BinaryPerceptron,
    binary_accuracy: BinaryAccuracy,
    rng: StdRng,
    epoch: u32,
}

/// Returns `true` if the features of `action` taken in `state` may be
/// learned from a partial tree, i.e., the tokens it touches are annotated.
fn is_annotated_action(gold: &GoldConfiguration, state: &State, action: Action) -> bool {
    let anchored = |token: Option<usize>| token.is_some_and(|t| gold.is_anchored(t));
    match action {
        Action::Shift => anchored(state.buffer_head()),
        Action::Reduce => anchored(state.peek()),
        Action::RightArc(_) | Action::LeftArc(_) => {
            anchored(state.peek()) && anchored(state.buffer_head())
        }
        Action::Unshift => true,
    }
}

/// Returns the transition leading to `successor` with the features of its
/// parent state, or `None` if the parent was carried over or the transition
/// cannot be learned from a partial tree.
fn transition_features<F>(
    sentence: &Sentence,
    gold: &GoldConfiguration,
    extractor: &F,
    beam: &[Configuration],
    successor: &Successor,
) -> Option<(Action, Vec<Option<FeatureKey>>)>
where
    F: FeatureExtractor,
{
    let action = successor.action(beam)?;
    let parent = beam[successor.parent].state();
    if gold.is_partial() && !is_annotated_action(gold, parent, action) {
        return None;
    }
    Some((action, extractor.extract(sentence, parent)))
}

/// Counts the features of every transition of a derivation.
fn count_features<F>(
    sentence: &Sentence,
    gold: &GoldConfiguration,
    extractor: &F,
    actions: &[Action],
) -> HashMap<(usize, Action, FeatureKey), f64>
where
    F: FeatureExtractor,
{
    let partial = gold.is_partial();
    let mut counts = HashMap::new();
    let mut config = Configuration::new(sentence);
    for &action in actions {
        if !partial || is_annotated_action(gold, config.state(), action) {
            let features = extractor.extract(sentence, config.state());
            for (slot, feature) in features.into_iter().enumerate() {
                if let Some(key) = feature {
                    *counts.entry((slot, action, key)).or_insert(0.0) += 1.0;
                }
            }
        }
        config.apply(action);
    }
    counts
}

impl<F> ArcEagerBeamTrainer<F>
where
    F: FeatureExtractor,
{
    /// Creates a trainer with zero weights.
    pub fn new(options: Options, extractor: F, n_labels: u32) -> Self {
        let n_slots = extractor.n_slots();
        let rng = StdRng::seed_from_u64(options.get_seed());
        Self {
            options,
            extractor,
            classifier: AveragedPerceptron::new(n_slots, n_labels),
            binary: BinaryPerceptron::new(n_slots, n_labels),
            binary_accuracy: BinaryAccuracy::default(),
            rng,
            epoch: 1,
        }
    }

    /// Options.
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Feature extractor.
    pub const fn extractor(&self) -> &F {
        &self.extractor
    }

    /// Transition classifier.
    pub const fn classifier(&self) -> &AveragedPerceptron {
        &self.classifier
    }

    /// Auxiliary oracle classifier.
    pub const fn binary_classifier(&self) -> &BinaryPerceptron {
        &self.binary
    }

    /// Consumes the trainer and returns the transition classifier.
    pub fn into_classifier(self) -> AveragedPerceptron {
        self.classifier
    }

    /// Consumes the trainer and returns the transition classifier and the
    /// auxiliary oracle classifier.
    pub fn into_classifiers(self) -> (AveragedPerceptron, BinaryPerceptron) {
        (self.classifier, self.binary)
    }

    fn validate(&self, sentence: &Sentence, gold: &GoldConfiguration) -> Result<()> {
        if sentence.root_first() != self.options.get_root_first() {
            return Err(ParserError::invalid_argument(
                "root placement of the sentence differs from the options",
            ));
        }
        let n_labels = self.classifier.n_labels();
        if let Some(label) = gold
            .tree()
            .into_iter()
            .flatten()
            .map(|(_, label)| label)
            .find(|&label| label >= n_labels)
        {
            return Err(ParserError::invalid_argument(format!(
                "label {label} is out of range (n_labels = {n_labels})"
            )));
        }
        Ok(())
    }

    /// Trains on one sentence.
    ///
    /// Beam search runs alongside the oracle derivations until the beam is
    /// terminal, or, with early updates, until no oracle is left in the
    /// beam. The perceptron is then updated on the difference between an
    /// oracle derivation and the predicted one. Iteration counters are not
    /// advanced.
    ///
    /// # Errors
    ///
    /// The sentence must follow the root placement of the options, and every
    /// gold label must be smaller than the number of labels.
    pub fn train_sentence(
        &mut self,
        sentence: &Sentence,
        gold: &GoldConfiguration,
    ) -> Result<SentenceOutcome> {
        self.validate(sentence, gold)?;
        let partial = gold.is_partial();
        if partial && self.epoch < self.options.get_partial_training_starting_iteration() {
            return Ok(SentenceOutcome::Skipped);
        }
        let initial = Configuration::new(sentence);
        if initial.is_terminal() {
            return Ok(SentenceOutcome::Unchanged { steps: 0 });
        }

        let Self {
            options,
            extractor,
            classifier,
            binary,
            binary_accuracy,
            rng,
            ..
        } = self;
        let extractor = &*extractor;
        let use_dynamic = options.get_use_dynamic_oracle() || partial;
        let update_mode = options.get_update_mode();

        let mut steps = 0;
        let pair = {
            let scorer = classifier.scorer(options.get_training_weights());
            let search = BeamSearch::new(
                sentence,
                extractor,
                &scorer,
                options.get_beam_width(),
                options.get_n_threads(),
            )?;
            let oracle = Oracle::new(sentence, gold, extractor, &scorer);

            let mut beam = vec![initial.clone()];
            let mut oracles = OracleSet::singleton(initial.clone());
            let mut best = initial.clone();
            let mut oracle_in_beam = false;
            let mut lost = false;
            let mut max_violation = f64::NEG_INFINITY;
            let mut max_pair = None;

            while !beam::is_terminal(&beam) {
                let new_oracles = if use_dynamic {
                    oracle.dynamic_step(&oracles)
                } else {
                    oracle.static_step(&oracles)
                };
                let Some(step_best) = new_oracles.best() else {
                    warn!("no oracle left after {steps} steps");
                    lost = true;
                    break;
                };
                best = step_best.clone();

                let successors = search.step(&beam)?;
                if successors.is_empty() {
                    break;
                }
                steps += 1;

                oracle_in_beam = false;
                for successor in &successors {
                    let is_oracle = new_oracles.contains(&successor.config);
                    oracle_in_beam |= is_oracle;
                    let Some((action, features)) =
                        transition_features(sentence, gold, extractor, &beam, successor)
                    else {
                        continue;
                    };
                    let matched = binary.predicts_oracle(action, &features) == is_oracle;
                    binary_accuracy.record(matched);
                    if !matched {
                        binary.correct(action, &features, is_oracle);
                    }
                }
                beam = successors.into_iter().map(|s| s.config).collect();

                let random_index = (options.get_use_random_oracle_selection()
                    && !new_oracles.is_empty())
                .then(|| rng.gen_range(0..new_oracles.len()));
                (oracles, best) = oracle::contract(new_oracles, &beam[0], best, random_index);

                if !oracle_in_beam {
                    match update_mode {
                        UpdateMode::Early => break,
                        UpdateMode::MaxViolation => {
                            let violation = beam[0].score() - best.score();
                            if violation > max_violation {
                                max_violation = violation;
                                max_pair = Some((beam[0].clone(), best.clone()));
                            }
                        }
                    }
                }
            }

            if lost {
                max_pair
            } else if oracle_in_beam && beam[0] == best {
                None
            } else {
                match update_mode {
                    UpdateMode::Early => Some((beam[0].clone(), best)),
                    UpdateMode::MaxViolation => {
                        let violation = beam[0].score() - best.score();
                        if violation > max_violation {
                            Some((beam[0].clone(), best))
                        } else {
                            max_pair
                        }
                    }
                }
            }
        };

        let Some((predicted, gold_config)) = pair else {
            return Ok(SentenceOutcome::Unchanged { steps });
        };
        let predicted = count_features(sentence, gold, extractor, predicted.actions());
        let mut changes = count_features(sentence, gold, extractor, gold_config.actions());
        for (key, count) in predicted {
            *changes.entry(key).or_insert(0.0) -= count;
        }
        let mut updated = false;
        for ((slot, action, key), change) in changes {
            if change != 0.0 && action != Action::Unshift {
                classifier.change_weight(action, slot, key, change);
                updated = true;
            }
        }
        Ok(if updated {
            SentenceOutcome::Updated { steps }
        } else {
            SentenceOutcome::Unchanged { steps }
        })
    }

    /// Runs `max_iter` passes over `data`.
    ///
    /// Both classifiers advance their iteration counters once per sentence,
    /// skipped partial trees included. After every pass, `dev` is parsed and
    /// evaluated if given, and `callback` receives the statistics and both
    /// classifiers.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iter` is 0, if a sentence is invalid, or if
    /// `callback` fails.
    pub fn train<C>(
        &mut self,
        data: &[(Sentence, GoldConfiguration)],
        max_iter: u32,
        dev: Option<DevSet<'_>>,
        mut callback: C,
    ) -> Result<()>
    where
        C: FnMut(&IterationStats, &AveragedPerceptron, &BinaryPerceptron) -> Result<()>,
    {
        if max_iter == 0 {
            return Err(ParserError::invalid_argument("max_iter must not be 0"));
        }
        for iteration in 1..=max_iter {
            self.epoch = iteration;
            let start = Instant::now();
            let mut n_trained = 0;
            let mut n_updated = 0;
            let mut n_skipped = 0;
            self.binary_accuracy = BinaryAccuracy::default();
            for (i, (sentence, gold)) in data.iter().enumerate() {
                let outcome = self.train_sentence(sentence, gold)?;
                debug!("sentence {i}: {outcome:?}");
                self.classifier.increment_iteration();
                self.binary.increment_iteration();
                match outcome {
                    SentenceOutcome::Skipped => n_skipped += 1,
                    SentenceOutcome::Updated { .. } => {
                        n_trained += 1;
                        n_updated += 1;
                    }
                    SentenceOutcome::Unchanged { .. } => n_trained += 1,
                }
            }
            let elapsed = start.elapsed();
            let weights = self.classifier.stats();
            info!(
                "iteration {iteration}: {n_trained} sentences, {n_updated} updates, {n_skipped} skipped, {:.2}s",
                elapsed.as_secs_f64(),
            );
            info!(
                "model size: {} right-arc, {} left-arc, {} non-zero averaged",
                weights.right_arc_weights, weights.left_arc_weights, weights.non_zero_averaged,
            );
            let binary = self.binary_accuracy;
            info!(
                "binary classifier: {:.2}% of {} transitions",
                binary.accuracy() * 100.0,
                binary.n_total,
            );

            let dev_accuracy = match &dev {
                Some(dev) => Some(self.evaluate(dev)?),
                None => None,
            };
            let dev_binary = match &dev {
                Some(dev) => Some(self.evaluate_binary(dev.data)?),
                None => None,
            };
            if let (Some(accuracy), Some(agreement)) = (&dev_accuracy, &dev_binary) {
                info!(
                    "dev: LAS {:.2}, UAS {:.2}, binary {:.2}",
                    accuracy.las() * 100.0,
                    accuracy.uas() * 100.0,
                    agreement.accuracy() * 100.0,
                );
            }

            let stats = IterationStats {
                iteration,
                n_trained,
                n_updated,
                n_skipped,
                elapsed,
                weights,
                binary,
                dev: dev_accuracy,
                dev_binary,
            };
            callback(&stats, &self.classifier, &self.binary)?;
        }
        Ok(())
    }

    fn evaluate(&self, dev: &DevSet<'_>) -> Result<Accuracy> {
        let parser = BeamParser::new(&self.classifier, &self.extractor, &self.options)?;
        let mut accuracy = Accuracy::default();
        for (sentence, gold) in dev.data {
            let tree = parser.parse(sentence)?;
            accuracy += dev.evaluator.evaluate(sentence, gold, &tree.heads);
        }
        Ok(accuracy)
    }

    /// Measures how often the auxiliary classifier agrees with oracle
    /// membership along the beam search of the current averaged weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a sentence is invalid or a scoring worker fails.
    pub fn evaluate_binary(
        &self,
        data: &[(Sentence, GoldConfiguration)],
    ) -> Result<BinaryAccuracy> {
        let scorer = self.classifier.scorer(WeightKind::Averaged);
        let mut accuracy = BinaryAccuracy::default();
        for (sentence, gold) in data {
            self.validate(sentence, gold)?;
            let search = BeamSearch::new(
                sentence,
                &self.extractor,
                &scorer,
                self.options.get_beam_width(),
                self.options.get_n_threads(),
            )?;
            let oracle = Oracle::new(sentence, gold, &self.extractor, &scorer);
            let use_dynamic = self.options.get_use_dynamic_oracle() || gold.is_partial();
            let initial = Configuration::new(sentence);
            let mut beam = vec![initial.clone()];
            let mut oracles = OracleSet::singleton(initial);
            while !beam::is_terminal(&beam) {
                let new_oracles = if use_dynamic {
                    oracle.dynamic_step(&oracles)
                } else {
                    oracle.static_step(&oracles)
                };
                let Some(best) = new_oracles.best().cloned() else {
                    break;
                };
                let successors = search.step(&beam)?;
                if successors.is_empty() {
                    break;
                }
                for successor in &successors {
                    let Some((action, features)) =
                        transition_features(sentence, gold, &self.extractor, &beam, successor)
                    else {
                        continue;
                    };
                    let is_oracle = new_oracles.contains(&successor.config);
                    accuracy.record(self.binary.predicts_oracle(action, &features) == is_oracle);
                }
                beam = successors.into_iter().map(|s| s.config).collect();
                (oracles, _) = oracle::contract(new_oracles, &beam[0], best, None);
            }
        }
        Ok(accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use crate::feature::BasicFeatureExtractor;
    use crate::perceptron::ActionScorer;
    use crate::sentence::IndexMaps;
    use crate::test_utils;

    /// Delegates to [`test_utils::StateExtractor`] on the calling thread and
    /// panics inside scoring workers.
    struct WorkerPanickingExtractor;

    impl FeatureExtractor for WorkerPanickingExtractor {
        fn n_slots(&self) -> usize {
            test_utils::StateExtractor.n_slots()
        }

        fn extract(&self, sentence: &Sentence, state: &State) -> Vec<Option<FeatureKey>> {
            assert!(thread::current().name().is_some(), "extraction failed");
            test_utils::StateExtractor.extract(sentence, state)
        }
    }

    fn options(width: usize, mode: UpdateMode) -> Options {
        Options::new()
            .beam_width(width)
            .unwrap()
            .n_threads(1)
            .unwrap()
            .update_mode(mode)
            .root_first(true)
    }

    #[test]
    fn test_gold_on_top_keeps_weights() {
        let (sentence, gold) = test_utils::abc(true);
        let mut trainer = ArcEagerBeamTrainer::new(
            options(1, UpdateMode::MaxViolation),
            test_utils::StateExtractor,
            3,
        );
        let actions = [
            Action::Shift,
            Action::LeftArc(0),
            Action::RightArc(1),
            Action::RightArc(2),
            Action::Reduce,
            Action::Reduce,
        ];
        test_utils::reward_derivation(
            &mut trainer.classifier,
            &sentence,
            &test_utils::StateExtractor,
            &actions,
            10.0,
        );
        trainer.classifier.increment_iteration();
        let before = trainer.classifier().clone();

        let outcome = trainer.train_sentence(&sentence, &gold).unwrap();
        assert_eq!(SentenceOutcome::Unchanged { steps: 6 }, outcome);
        assert_eq!(&before, trainer.classifier());
    }

    #[test]
    fn test_early_update() {
        // root -> A -> B. The empty model prefers shifting A, which loses
        // its root arc at the first step.
        let sentence = test_utils::sentence(2, true);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 0)), Some((1, 0))]).unwrap();
        let extractor = test_utils::StateExtractor;
        let mut trainer = ArcEagerBeamTrainer::new(
            options(1, UpdateMode::Early).use_dynamic_oracle(false),
            extractor,
            1,
        );
        let outcome = trainer.train_sentence(&sentence, &gold).unwrap();
        assert_eq!(SentenceOutcome::Updated { steps: 1 }, outcome);

        let initial = Configuration::new(&sentence);
        let features = extractor.extract(&sentence, initial.state());
        let scorer = trainer.classifier().scorer(WeightKind::Live);
        assert_eq!(vec![3.0], scorer.right_arc_scores(&features));
        assert_eq!(-3.0, scorer.shift_score(&features));
    }

    #[test]
    fn test_max_violation_update() {
        let sentence = test_utils::sentence(2, true);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 0)), Some((1, 0))]).unwrap();
        let extractor = test_utils::StateExtractor;
        let mut trainer =
            ArcEagerBeamTrainer::new(options(2, UpdateMode::MaxViolation), extractor, 1);
        let outcome = trainer.train_sentence(&sentence, &gold).unwrap();
        assert!(matches!(outcome, SentenceOutcome::Updated { .. }));

        // The oracle's first transition is rewarded.
        let initial = Configuration::new(&sentence);
        let features = extractor.extract(&sentence, initial.state());
        let scorer = trainer.classifier().scorer(WeightKind::Live);
        assert!(scorer.right_arc_scores(&features)[0] > scorer.shift_score(&features));
    }

    #[test]
    fn test_partial_skipped() {
        let sentence = test_utils::sentence(2, true);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 0)), None]).unwrap();
        let mut trainer = ArcEagerBeamTrainer::new(
            options(2, UpdateMode::MaxViolation),
            test_utils::StateExtractor,
            1,
        );
        assert_eq!(
            SentenceOutcome::Skipped,
            trainer.train_sentence(&sentence, &gold).unwrap(),
        );
        trainer.epoch = 3;
        assert_ne!(
            SentenceOutcome::Skipped,
            trainer.train_sentence(&sentence, &gold).unwrap(),
        );
    }

    #[test]
    fn test_invalid_input() {
        let mut trainer = ArcEagerBeamTrainer::new(
            options(2, UpdateMode::MaxViolation),
            test_utils::StateExtractor,
            1,
        );
        let sentence = test_utils::sentence(2, true);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 1)), Some((1, 0))]).unwrap();
        assert!(trainer.train_sentence(&sentence, &gold).is_err());

        let sentence = test_utils::sentence(2, false);
        let gold = GoldConfiguration::new(&sentence, &[Some((0, 0)), Some((1, 0))]).unwrap();
        assert!(trainer.train_sentence(&sentence, &gold).is_err());

        assert!(trainer.train(&[], 0, None, |_, _, _| Ok(())).is_err());
    }

    #[test]
    fn test_train_corpus() {
        let mut maps = IndexMaps::new();
        let labels = ["nsubj", "root", "obj", "det", "punct"];
        for label in labels {
            maps.labels.lookup_or_insert(label);
        }
        let corpus: &[&[(&str, &str, usize, &str)]] = &[
            &[
                ("John", "NNP", 2, "nsubj"),
                ("saw", "VBD", 0, "root"),
                ("Mary", "NNP", 2, "obj"),
                (".", ".", 2, "punct"),
            ],
            &[
                ("the", "DT", 2, "det"),
                ("dog", "NN", 3, "nsubj"),
                ("barked", "VBD", 0, "root"),
            ],
            &[
                ("Mary", "NNP", 2, "nsubj"),
                ("likes", "VBZ", 0, "root"),
                ("the", "DT", 4, "det"),
                ("cat", "NN", 2, "obj"),
                (".", ".", 2, "punct"),
            ],
        ];
        let data: Vec<_> = corpus
            .iter()
            .map(|rows| {
                let sentence = maps.sentence(rows.iter().map(|r| (r.0, r.1)), true);
                let heads: Vec<_> = rows
                    .iter()
                    .map(|r| Some((r.2, maps.labels.id(r.3).unwrap())))
                    .collect();
                let gold = GoldConfiguration::new(&sentence, &heads).unwrap();
                (sentence, gold)
            })
            .collect();

        let options = Options::new()
            .beam_width(4)
            .unwrap()
            .n_threads(2)
            .unwrap()
            .root_first(true)
            .training_weights(WeightKind::Live);
        let mut trainer = ArcEagerBeamTrainer::new(options, BasicFeatureExtractor::new(), 5);
        let evaluator = Evaluator::new([maps.tags.id(".").unwrap()]);
        let mut history = vec![];
        trainer
            .train(
                &data,
                10,
                Some(DevSet {
                    data: &data,
                    evaluator: &evaluator,
                }),
                |stats, _, _| {
                    history.push(stats.clone());
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(10, history.len());
        assert_eq!(3, history[0].n_trained);
        assert_eq!(31, trainer.classifier().iteration());
        let last = history.last().unwrap();
        assert!(last.dev.unwrap().uas() >= 0.9);
        assert!(last.weights.right_arc_weights > 0);
        assert!(last.binary.n_total > 0);
        assert!(last.dev_binary.unwrap().n_total > 0);
    }

    #[test]
    fn test_skipped_sentences_advance_iteration() {
        let partial = test_utils::sentence(2, true);
        let partial_gold = GoldConfiguration::new(&partial, &[Some((0, 0)), None]).unwrap();
        let (sentence, gold) = test_utils::abc(true);
        let data = vec![(partial, partial_gold), (sentence, gold)];
        let mut trainer = ArcEagerBeamTrainer::new(
            options(2, UpdateMode::MaxViolation),
            test_utils::StateExtractor,
            3,
        );
        let mut history = vec![];
        trainer
            .train(&data, 1, None, |stats, classifier, binary| {
                history.push((stats.clone(), classifier.iteration(), binary.iteration()));
                Ok(())
            })
            .unwrap();

        let (stats, iteration, binary_iteration) = &history[0];
        assert_eq!(1, stats.n_skipped);
        assert_eq!(1, stats.n_trained);
        assert_eq!(3, *iteration);
        assert_eq!(3, *binary_iteration);
        assert_eq!(None, stats.dev_binary);
    }

    #[test]
    fn test_binary_correction() {
        // The empty model keeps Shift and RightArc(0) from the initial state.
        // Only Shift is an oracle transition, so RightArc(0) is corrected.
        let (sentence, gold) = test_utils::abc(true);
        let extractor = test_utils::StateExtractor;
        let mut trainer = ArcEagerBeamTrainer::new(
            options(2, UpdateMode::Early).use_dynamic_oracle(false),
            extractor,
            3,
        );
        trainer.train_sentence(&sentence, &gold).unwrap();

        let initial = Configuration::new(&sentence);
        let features = extractor.extract(&sentence, initial.state());
        let live = trainer.binary_classifier().scorer(WeightKind::Live);
        assert!(live.right_arc_scores(&features)[0] < 0.0);
        assert_eq!(0.0, live.right_arc_scores(&features)[1]);
        assert!(trainer.binary_accuracy.n_total >= 2);
        assert!(trainer.binary_accuracy.n_matched < trainer.binary_accuracy.n_total);

        let agreement = trainer.evaluate_binary(&[(sentence, gold)]).unwrap();
        assert!(agreement.n_total > 0);
    }

    #[test]
    fn test_random_oracle_selection() {
        let (sentence, gold) = test_utils::abc(true);
        let train = |random: bool| {
            let options = options(2, UpdateMode::MaxViolation)
                .use_random_oracle_selection(random)
                .seed(5);
            let mut trainer = ArcEagerBeamTrainer::new(options, test_utils::StateExtractor, 3);
            let outcome = trainer.train_sentence(&sentence, &gold).unwrap();
            (outcome, trainer)
        };

        let (outcome, mut trainer) = train(true);
        assert!(matches!(outcome, SentenceOutcome::Updated { .. }));
        let (_, mut again) = train(true);
        assert_eq!(trainer.classifier(), again.classifier());
        let next: u64 = trainer.rng.gen();
        assert_eq!(next, again.rng.gen::<u64>());

        // Oracle choices draw from the seeded generator only when enabled.
        let fresh: u64 = StdRng::seed_from_u64(5).gen();
        assert_ne!(fresh, next);
        let (_, mut unused) = train(false);
        assert_eq!(fresh, unused.rng.gen::<u64>());
    }

    #[test]
    fn test_partial_features_filtered() {
        // Word 2 has no gold head.
        let sentence = test_utils::sentence(2, true);
        let extractor = test_utils::StateExtractor;
        let actions = [
            Action::RightArc(0),
            Action::RightArc(0),
            Action::Reduce,
            Action::Reduce,
        ];

        let partial = GoldConfiguration::new(&sentence, &[Some((0, 0)), None]).unwrap();
        let initial = Configuration::new(&sentence);
        let after_arc = Configuration::replay(&sentence, &actions[..1]);
        assert!(is_annotated_action(&partial, initial.state(), actions[0]));
        assert!(!is_annotated_action(&partial, after_arc.state(), Action::RightArc(0)));
        assert!(!is_annotated_action(&partial, after_arc.state(), Action::Shift));
        assert!(is_annotated_action(&partial, after_arc.state(), Action::Unshift));

        let counts = count_features(&sentence, &partial, &extractor, &actions);
        assert_eq!(5, counts.len());
        assert!(counts.contains_key(&(1, Action::RightArc(0), 1)));
        assert!(!counts.contains_key(&(1, Action::RightArc(0), 2)));
        assert!(counts.contains_key(&(0, Action::Reduce, 1)));
        assert!(!counts.contains_key(&(0, Action::Reduce, 2)));

        let complete = GoldConfiguration::new(&sentence, &[Some((0, 0)), Some((1, 0))]).unwrap();
        let counts = count_features(&sentence, &complete, &extractor, &actions);
        assert_eq!(10, counts.len());
        assert_eq!(Some(&1.0), counts.get(&(1, Action::RightArc(0), 2)));
    }

    #[test]
    fn test_worker_failure() {
        let (sentence, gold) = test_utils::abc(true);
        let options = options(4, UpdateMode::MaxViolation).n_threads(2).unwrap();
        let mut trainer = ArcEagerBeamTrainer::new(options, WorkerPanickingExtractor, 3);
        assert!(matches!(
            trainer.train_sentence(&sentence, &gold),
            Err(ParserError::Worker { .. })
        ));
    }

    #[test]
    fn test_static_oracle_greedy() {
        let (sentence, gold) = test_utils::abc(true);
        let options = options(1, UpdateMode::Early).use_dynamic_oracle(false);
        let mut trainer = ArcEagerBeamTrainer::new(options, test_utils::StateExtractor, 3);
        let data = vec![(sentence.clone(), gold.clone())];
        let mut n_updated = vec![];
        trainer
            .train(&data, 10, None, |stats, _, _| {
                n_updated.push(stats.n_updated);
                Ok(())
            })
            .unwrap();
        assert_eq!(Some(&0), n_updated.last());

        let parser = BeamParser::new(
            trainer.classifier(),
            &test_utils::StateExtractor,
            trainer.options(),
        )
        .unwrap();
        let tree = parser.parse(&sentence).unwrap();
        assert_eq!(
            vec![Some((2, 0)), Some((0, 1)), Some((2, 2))],
            tree.heads
        );
        assert_eq!(gold.tree(), tree.heads);
    }
}
