use std::hash::{DefaultHasher, Hash, Hasher};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::action::Action;
use crate::configuration::Configuration;
use crate::feature::{FeatureExtractor, FeatureKey};
use crate::gold::GoldConfiguration;
use crate::perceptron::{AveragedPerceptron, Classifier};
use crate::sentence::{Sentence, Token};
use crate::state::State;

macro_rules! hashmap {
    ( $($k:expr => $v:expr,)* ) => {
        {
            #[allow(unused_mut)]
            let mut h = hashbrown::HashMap::new();
            $(
                h.insert($k, $v);
            )*
            h
        }
    };
    ( $($k:expr => $v:expr),* ) => {
        hashmap![$( $k => $v, )*]
    };
}

pub(crate) use hashmap;

/// A sentence of `n` words with word `i` and tag `i % 3`.
pub fn sentence(n: usize, root_first: bool) -> Sentence {
    let tokens = (1..=n)
        .map(|i| {
            let i = u32::try_from(i).unwrap();
            Token::new(i, i % 3)
        })
        .collect();
    Sentence::new(tokens, root_first)
}

/// "A B C" with A <- B (label 0), root -> B (label 1), and B -> C (label 2).
pub fn abc(root_first: bool) -> (Sentence, GoldConfiguration) {
    let sentence = sentence(3, root_first);
    let gold =
        GoldConfiguration::new(&sentence, &[Some((2, 0)), Some((0, 1)), Some((2, 2))]).unwrap();
    (sentence, gold)
}

/// Extracts the stack top, the buffer head, and a hash of the whole state,
/// so that distinct states never share every feature.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateExtractor;

impl FeatureExtractor for StateExtractor {
    fn n_slots(&self) -> usize {
        3
    }

    fn extract(&self, _sentence: &Sentence, state: &State) -> Vec<Option<FeatureKey>> {
        let mut hasher = DefaultHasher::new();
        state.hash(&mut hasher);
        vec![
            state.peek().map(|p| p as u64),
            state.buffer_head().map(|p| p as u64),
            Some(hasher.finish()),
        ]
    }
}

pub fn empty_model(n_labels: u32) -> AveragedPerceptron {
    AveragedPerceptron::new(StateExtractor.n_slots(), n_labels)
}

/// Live weights in `[-0.5, 0.5)` drawn from a seeded generator on the
/// position features of every transition.
pub fn random_model<F: FeatureExtractor>(
    sentence: &Sentence,
    extractor: &F,
    n_labels: u32,
    seed: u64,
) -> AveragedPerceptron {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = AveragedPerceptron::new(extractor.n_slots(), n_labels);
    let mut actions = vec![Action::Shift, Action::Reduce];
    for label in 0..n_labels {
        actions.push(Action::RightArc(label));
        actions.push(Action::LeftArc(label));
    }
    for slot in 0..2 {
        for key in 0..sentence.n_positions() as u64 {
            for &action in &actions {
                model.change_weight(action, slot, key, rng.gen_range(-0.5..0.5));
            }
        }
    }
    model
}

/// Rewards every transition of a derivation on the features of the state it
/// is taken from.
pub fn reward_derivation<F: FeatureExtractor>(
    model: &mut AveragedPerceptron,
    sentence: &Sentence,
    extractor: &F,
    actions: &[Action],
    reward: f64,
) {
    let mut config = Configuration::new(sentence);
    for &action in actions {
        let features = extractor.extract(sentence, config.state());
        for (slot, feature) in features.iter().enumerate() {
            if let Some(key) = *feature {
                model.change_weight(action, slot, key, reward);
            }
        }
        config.apply(action);
    }
}
