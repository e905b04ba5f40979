use alloc::string::{String, ToString};
use alloc::vec::Vec;

use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};
use hashbrown::HashMap;

/// Word and tag ID of the artificial root token.
pub const ROOT_ID: u32 = u32::MAX;

/// Represents a word of a sentence as vocabulary IDs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Token {
    /// Word ID
    pub word: u32,

    /// Part-of-speech tag ID
    pub tag: u32,
}

impl Token {
    /// Creates a new token.
    #[inline(always)]
    pub const fn new(word: u32, tag: u32) -> Self {
        Self { word, tag }
    }

    /// The artificial root token.
    pub const ROOT: Self = Self::new(ROOT_ID, ROOT_ID);
}

/// Represents an input sentence.
///
/// Words occupy positions `1..=n`. The artificial root sits at position `0`
/// when the sentence is parsed root-first, and at position `n + 1` otherwise.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sentence {
    tokens: Vec<Token>,
    root_first: bool,
}

impl Sentence {
    /// Creates a new sentence.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Words of the sentence, without the root.
    /// * `root_first` - If `true`, the root is placed before the first word.
    pub fn new(tokens: Vec<Token>, root_first: bool) -> Self {
        Self { tokens, root_first }
    }

    /// Returns the number of words, excluding the root.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the sentence has no word.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns `true` if the root is placed before the first word.
    #[inline(always)]
    pub const fn root_first(&self) -> bool {
        self.root_first
    }

    /// Position of the root.
    #[inline(always)]
    pub fn root(&self) -> usize {
        if self.root_first {
            0
        } else {
            self.tokens.len() + 1
        }
    }

    /// Size of per-position tables, covering positions `0..=n + 1`.
    #[inline(always)]
    pub fn n_positions(&self) -> usize {
        self.tokens.len() + 2
    }

    /// Returns the token at the given position, or `None` if the position
    /// holds nothing.
    #[inline(always)]
    pub fn token(&self, position: usize) -> Option<Token> {
        if position == self.root() {
            Some(Token::ROOT)
        } else if (1..=self.tokens.len()).contains(&position) {
            Some(self.tokens[position - 1])
        } else {
            None
        }
    }

    /// Returns the words without the root.
    #[inline(always)]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Bidirectional mapping between strings and dense IDs.
#[derive(Clone, Debug, Default)]
pub struct Vocab {
    ids: HashMap<String, u32>,
    names: Vec<String>,
}

impl Vocab {
    /// Creates a new empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID of `name`, registering it first if it is unknown.
    pub fn lookup_or_insert(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = u32::try_from(self.names.len()).unwrap_or(ROOT_ID - 1);
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    /// Returns the ID of `name` if it is known.
    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Returns the string of the given ID.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(usize::try_from(id).ok()?).map(String::as_str)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there is no entry.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<Context> Decode<Context> for Vocab {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let names: Vec<String> = Decode::decode(decoder)?;
        let mut vocab = Self::new();
        for name in &names {
            vocab.lookup_or_insert(name);
        }
        Ok(vocab)
    }
}
bincode::impl_borrow_decode!(Vocab);

impl Encode for Vocab {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        Encode::encode(&self.names, encoder)
    }
}

/// String tables for words, POS tags, and dependency labels.
#[derive(Clone, Debug, Default, Decode, Encode)]
pub struct IndexMaps {
    /// Word vocabulary
    pub words: Vocab,

    /// POS tag vocabulary
    pub tags: Vocab,

    /// Dependency label catalog
    pub labels: Vocab,
}

impl IndexMaps {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts `(word, tag)` pairs into a [`Sentence`], registering unseen strings.
    pub fn sentence<'a, I>(&mut self, words: I, root_first: bool) -> Sentence
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let tokens = words
            .into_iter()
            .map(|(word, tag)| {
                Token::new(
                    self.words.lookup_or_insert(word),
                    self.tags.lookup_or_insert(tag),
                )
            })
            .collect();
        Sentence::new(tokens, root_first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_position() {
        let tokens = vec![Token::new(1, 1), Token::new(2, 2), Token::new(3, 1)];

        let sentence = Sentence::new(tokens.clone(), true);
        assert_eq!(0, sentence.root());
        assert_eq!(Some(Token::ROOT), sentence.token(0));
        assert_eq!(Some(Token::new(1, 1)), sentence.token(1));
        assert_eq!(None, sentence.token(4));

        let sentence = Sentence::new(tokens, false);
        assert_eq!(4, sentence.root());
        assert_eq!(None, sentence.token(0));
        assert_eq!(Some(Token::new(3, 1)), sentence.token(3));
        assert_eq!(Some(Token::ROOT), sentence.token(4));
        assert_eq!(5, sentence.n_positions());
    }

    #[test]
    fn test_vocab() {
        let mut vocab = Vocab::new();
        assert_eq!(0, vocab.lookup_or_insert("nsubj"));
        assert_eq!(1, vocab.lookup_or_insert("obj"));
        assert_eq!(0, vocab.lookup_or_insert("nsubj"));
        assert_eq!(Some(1), vocab.id("obj"));
        assert_eq!(None, vocab.id("det"));
        assert_eq!(Some("obj"), vocab.name(1));
        assert_eq!(2, vocab.len());
    }

    #[test]
    fn test_vocab_round_trip() {
        let mut maps = IndexMaps::new();
        let sentence = maps.sentence([("A", "DT"), ("B", "NN"), ("C", "DT")], false);
        assert_eq!(Token::new(0, 0), sentence.tokens()[0]);
        assert_eq!(Token::new(2, 0), sentence.tokens()[2]);

        let bytes = bincode::encode_to_vec(&maps, bincode::config::standard()).unwrap();
        let (decoded, _): (IndexMaps, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(Some(1), decoded.words.id("B"));
        assert_eq!(Some("NN"), decoded.tags.name(1));
    }
}
