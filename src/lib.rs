//! # arcbeam
//!
//! Arc-Eager dependency parser with beam search, trained with the structured
//! perceptron in pure Rust
#![cfg_attr(
    feature = "train",
    doc = "
## Examples

```rust
use arcbeam::{
    ArcEagerBeamTrainer, BasicFeatureExtractor, GoldConfiguration, IndexMaps, Model, Options,
};

let mut maps = IndexMaps::new();
let nsubj = maps.labels.lookup_or_insert(\"nsubj\");
let root = maps.labels.lookup_or_insert(\"root\");
let obj = maps.labels.lookup_or_insert(\"obj\");

// John saw Mary
let sentence = maps.sentence([(\"John\", \"NNP\"), (\"saw\", \"VBD\"), (\"Mary\", \"NNP\")], false);
let gold = GoldConfiguration::new(
    &sentence,
    &[Some((2, nsubj)), Some((0, root)), Some((2, obj))],
)
.unwrap();
let data = vec![(sentence.clone(), gold)];

let options = Options::new().beam_width(4).unwrap().n_threads(1).unwrap();
let mut trainer = ArcEagerBeamTrainer::new(
    options.clone(),
    BasicFeatureExtractor::new(),
    maps.labels.len() as u32,
);
trainer.train(&data, 10, None, |_, _, _| Ok(())).unwrap();

let (classifier, binary) = trainer.into_classifiers();
let model = Model::new(maps, options, classifier).with_binary(binary);
let extractor = BasicFeatureExtractor::new();
let parser = model.parser(&extractor).unwrap();
let tree = parser.parse(&sentence).unwrap();

assert_eq!(3, tree.heads.len());
assert!(tree.heads.iter().all(Option::is_some));
```
"
)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate alloc;

mod action;
pub mod arc_eager;
mod beam;
mod configuration;
mod errors;
mod eval;
mod feature;
mod gold;
mod model;
mod options;
mod oracle;
mod parser;
mod perceptron;
mod sentence;
mod state;
mod vector;

#[cfg(feature = "train")]
mod trainer;

#[cfg(test)]
mod test_utils;

pub use action::Action;
pub use beam::{is_terminal, BeamElement, BeamSearch, BoundedBeam, Successor};
pub use configuration::Configuration;
pub use errors::{ParserError, Result};
pub use eval::{Accuracy, BinaryAccuracy, Evaluator};
pub use feature::{BasicFeatureExtractor, FeatureExtractor, FeatureKey};
pub use gold::GoldConfiguration;
pub use model::Model;
pub use options::{Options, UpdateMode};
pub use oracle::{contract, Oracle, OracleSet};
pub use parser::{BeamParser, ParsedTree};
pub use perceptron::{ActionScorer, AveragedPerceptron, BinaryPerceptron, Classifier, Scorer};
pub use sentence::{IndexMaps, Sentence, Token, Vocab, ROOT_ID};
pub use state::State;
pub use vector::{AveragedValue, CompactArray, WeightKind, WeightStats, WeightTables};

#[cfg(feature = "train")]
pub use trainer::{ArcEagerBeamTrainer, DevSet, IterationStats, SentenceOutcome};
