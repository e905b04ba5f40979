use alloc::vec::Vec;

use crate::action::Action;
use crate::beam::{self, BeamSearch};
use crate::configuration::Configuration;
use crate::errors::{ParserError, Result};
use crate::feature::FeatureExtractor;
use crate::gold::GoldConfiguration;
use crate::options::Options;
use crate::perceptron::{AveragedPerceptron, Classifier, Scorer};
use crate::sentence::Sentence;
use crate::state::State;
use crate::vector::WeightKind;

/// Dependency tree predicted for a sentence.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedTree {
    /// `(head, label)` of every word. Heads follow the CoNLL convention:
    /// words are numbered from `1` and `0` stands for the root.
    pub heads: Vec<Option<(usize, u32)>>,

    /// Transitions of the derivation.
    pub actions: Vec<Action>,

    /// Model score of the derivation.
    pub score: f64,
}

impl From<&Configuration> for ParsedTree {
    fn from(config: &Configuration) -> Self {
        Self {
            heads: config.tree(),
            actions: config.actions().to_vec(),
            score: config.score(),
        }
    }
}

/// Beam-search parser scoring with the averaged weights of a model.
pub struct BeamParser<'a, F> {
    extractor: &'a F,
    scorer: Scorer<'a>,
    width: usize,
    n_threads: usize,
}

impl<'a, F> BeamParser<'a, F>
where
    F: FeatureExtractor,
{
    /// Creates a parser.
    ///
    /// # Errors
    ///
    /// The extractor must produce as many feature slots as the model holds.
    pub fn new(
        classifier: &'a AveragedPerceptron,
        extractor: &'a F,
        options: &Options,
    ) -> Result<Self> {
        if classifier.n_slots() != extractor.n_slots() {
            return Err(ParserError::invalid_argument(format!(
                "the model has {} feature slots, but the extractor produces {}",
                classifier.n_slots(),
                extractor.n_slots(),
            )));
        }
        Ok(Self {
            extractor,
            scorer: classifier.scorer(WeightKind::Averaged),
            width: options.get_beam_width(),
            n_threads: options.get_n_threads(),
        })
    }

    fn search<P>(&self, sentence: &Sentence, allow: Option<P>) -> Result<ParsedTree>
    where
        P: Fn(&State, Action) -> bool + Sync,
    {
        let search = BeamSearch::new(
            sentence,
            self.extractor,
            &self.scorer,
            self.width,
            self.n_threads,
        )?;
        let mut beam = vec![Configuration::new(sentence)];
        while !beam::is_terminal(&beam) {
            let mut successors = match &allow {
                Some(allow) => search.step_with(&beam, allow)?,
                None => search.step(&beam)?,
            };
            if successors.is_empty() && allow.is_some() {
                successors = search.step(&beam)?;
            }
            if successors.is_empty() {
                break;
            }
            beam = successors.into_iter().map(|s| s.config).collect();
        }
        Ok(ParsedTree::from(&beam[0]))
    }

    /// Parses a sentence and returns the best-scoring tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::Worker`] if a scoring worker fails.
    pub fn parse(&self, sentence: &Sentence) -> Result<ParsedTree> {
        self.search(sentence, None::<fn(&State, Action) -> bool>)
    }

    /// Parses a sentence keeping the annotated arcs of a partial tree.
    ///
    /// Only transitions that lose no annotated arc are considered. Steps
    /// where no such transition exists, and trees with crossing arcs, are
    /// searched without the restriction.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::Worker`] if a scoring worker fails.
    pub fn parse_partial(
        &self,
        sentence: &Sentence,
        gold: &GoldConfiguration,
    ) -> Result<ParsedTree> {
        if gold.is_non_projective() {
            return self.parse(sentence);
        }
        self.search(
            sentence,
            Some(|state: &State, action| gold.action_cost(action, state) == Some(0)),
        )
    }
}
