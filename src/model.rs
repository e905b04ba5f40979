use std::io::{Read, Write};

use bincode::{Decode, Encode};

use crate::errors::Result;
use crate::feature::FeatureExtractor;
use crate::options::Options;
use crate::parser::BeamParser;
use crate::perceptron::{AveragedPerceptron, BinaryPerceptron};
use crate::sentence::IndexMaps;

/// Trained parser: string tables, options, and transition weights, with the
/// auxiliary oracle classifier if it was kept.
#[derive(Clone, Debug, Decode, Encode)]
pub struct Model {
    /// String tables
    pub maps: IndexMaps,

    /// Options used in training
    pub options: Options,

    /// Transition weights
    pub classifier: AveragedPerceptron,

    /// Auxiliary oracle classifier
    pub binary: Option<BinaryPerceptron>,
}

impl Model {
    /// Creates a new model.
    pub const fn new(maps: IndexMaps, options: Options, classifier: AveragedPerceptron) -> Self {
        Self {
            maps,
            options,
            classifier,
            binary: None,
        }
    }

    /// Attaches the auxiliary oracle classifier.
    pub fn with_binary(mut self, binary: BinaryPerceptron) -> Self {
        self.binary = Some(binary);
        self
    }

    /// Writes the model.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write<W: Write>(&self, mut wtr: W) -> Result<usize> {
        let n = bincode::encode_into_std_write(self, &mut wtr, bincode::config::standard())?;
        Ok(n)
    }

    /// Reads a model written by [`Self::write()`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading or decoding fails.
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let model = bincode::decode_from_std_read(&mut rdr, bincode::config::standard())?;
        Ok(model)
    }

    /// Returns a parser using the model's weights and options.
    ///
    /// # Errors
    ///
    /// The extractor must produce as many feature slots as the model holds.
    pub fn parser<'a, F>(&'a self, extractor: &'a F) -> Result<BeamParser<'a, F>>
    where
        F: FeatureExtractor,
    {
        BeamParser::new(&self.classifier, extractor, &self.options)
    }
}
