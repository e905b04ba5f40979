use core::ops::AddAssign;

use hashbrown::HashSet;

use crate::gold::GoldConfiguration;
use crate::sentence::Sentence;

/// Attachment and exact-match counts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Accuracy {
    /// Number of evaluated tokens.
    pub n_tokens: usize,

    /// Tokens with the correct head.
    pub n_unlabeled: usize,

    /// Tokens with the correct head and label.
    pub n_labeled: usize,

    /// Number of evaluated sentences.
    pub n_sentences: usize,

    /// Sentences whose evaluated tokens all have the correct head.
    pub n_unlabeled_exact: usize,

    /// Sentences whose evaluated tokens all have the correct head and label.
    pub n_labeled_exact: usize,
}

fn ratio(x: usize, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        x as f64 / n as f64
    }
}

impl Accuracy {
    /// Unlabeled attachment score.
    pub fn uas(&self) -> f64 {
        ratio(self.n_unlabeled, self.n_tokens)
    }

    /// Labeled attachment score.
    pub fn las(&self) -> f64 {
        ratio(self.n_labeled, self.n_tokens)
    }

    /// Ratio of sentences without head errors.
    pub fn unlabeled_exact_match(&self) -> f64 {
        ratio(self.n_unlabeled_exact, self.n_sentences)
    }

    /// Ratio of sentences without head or label errors.
    pub fn labeled_exact_match(&self) -> f64 {
        ratio(self.n_labeled_exact, self.n_sentences)
    }
}

impl AddAssign for Accuracy {
    fn add_assign(&mut self, other: Self) {
        self.n_tokens += other.n_tokens;
        self.n_unlabeled += other.n_unlabeled;
        self.n_labeled += other.n_labeled;
        self.n_sentences += other.n_sentences;
        self.n_unlabeled_exact += other.n_unlabeled_exact;
        self.n_labeled_exact += other.n_labeled_exact;
    }
}

/// Agreement of the auxiliary classifier with oracle membership.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BinaryAccuracy {
    /// Transitions whose prediction matched oracle membership.
    pub n_matched: usize,

    /// Number of judged transitions.
    pub n_total: usize,
}

impl BinaryAccuracy {
    /// Records one judgement.
    #[inline(always)]
    pub fn record(&mut self, matched: bool) {
        self.n_matched += usize::from(matched);
        self.n_total += 1;
    }

    /// Ratio of matched transitions.
    pub fn accuracy(&self) -> f64 {
        ratio(self.n_matched, self.n_total)
    }
}

impl AddAssign for BinaryAccuracy {
    fn add_assign(&mut self, other: Self) {
        self.n_matched += other.n_matched;
        self.n_total += other.n_total;
    }
}

/// Compares predicted trees with gold trees, ignoring punctuation.
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    punctuation: HashSet<u32>,
}

impl Evaluator {
    /// Creates an evaluator skipping tokens whose tag is in `punctuation`.
    pub fn new<I>(punctuation: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            punctuation: punctuation.into_iter().collect(),
        }
    }

    /// Evaluates one predicted tree.
    ///
    /// Unannotated gold tokens are skipped along with punctuation. Heads
    /// follow the CoNLL convention as returned by
    /// [`GoldConfiguration::tree()`].
    pub fn evaluate(
        &self,
        sentence: &Sentence,
        gold: &GoldConfiguration,
        predicted: &[Option<(usize, u32)>],
    ) -> Accuracy {
        let mut accuracy = Accuracy {
            n_sentences: 1,
            ..Accuracy::default()
        };
        let mut unlabeled_exact = true;
        let mut labeled_exact = true;
        let gold_tree = gold.tree();
        for (i, (token, gold_arc)) in sentence.tokens().iter().zip(&gold_tree).enumerate() {
            if self.punctuation.contains(&token.tag) {
                continue;
            }
            let Some((gold_head, gold_label)) = *gold_arc else {
                continue;
            };
            accuracy.n_tokens += 1;
            match predicted.get(i).copied().flatten() {
                Some((head, label)) if head == gold_head => {
                    accuracy.n_unlabeled += 1;
                    if label == gold_label {
                        accuracy.n_labeled += 1;
                    } else {
                        labeled_exact = false;
                    }
                }
                _ => {
                    unlabeled_exact = false;
                    labeled_exact = false;
                }
            }
        }
        accuracy.n_unlabeled_exact = usize::from(unlabeled_exact);
        accuracy.n_labeled_exact = usize::from(labeled_exact);
        accuracy
    }
}
