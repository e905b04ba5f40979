use core::fmt;
use core::str::FromStr;

use bincode::{Decode, Encode};

use crate::errors::{ParserError, Result};
use crate::vector::WeightKind;

/// Strategy for choosing the prefix pair the perceptron is updated on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Decode, Encode)]
pub enum UpdateMode {
    /// Updates as soon as every gold derivation falls off the beam.
    Early,

    /// Updates on the prefix pair with the largest score violation.
    MaxViolation,
}

impl UpdateMode {
    /// Returns [`UpdateMode::MaxViolation`] if `max_violation` is `true`,
    /// and [`UpdateMode::Early`] otherwise.
    pub const fn from_max_violation(max_violation: bool) -> Self {
        if max_violation {
            Self::MaxViolation
        } else {
            Self::Early
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Early => write!(f, "early"),
            Self::MaxViolation => write!(f, "max_violation"),
        }
    }
}

impl FromStr for UpdateMode {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "early" => Ok(Self::Early),
            "max_violation" => Ok(Self::MaxViolation),
            _ => Err(ParserError::invalid_argument(format!(
                "unknown update mode: {s}"
            ))),
        }
    }
}

/// Settings of parsing and training.
#[derive(Clone, Debug, PartialEq, Decode, Encode)]
pub struct Options {
    beam_width: usize,
    n_threads: usize,
    use_dynamic_oracle: bool,
    update_mode: UpdateMode,
    use_random_oracle_selection: bool,
    root_first: bool,
    partial_training_starting_iteration: u32,
    seed: u64,
    training_weights: WeightKind,
}

impl Options {
    /// Creates options with the default settings.
    pub const fn new() -> Self {
        Self {
            beam_width: 64,
            n_threads: 8,
            use_dynamic_oracle: true,
            update_mode: UpdateMode::MaxViolation,
            use_random_oracle_selection: false,
            root_first: false,
            partial_training_starting_iteration: 3,
            seed: 0,
            training_weights: WeightKind::Averaged,
        }
    }

    /// Sets the beam width.
    ///
    /// # Errors
    ///
    /// `beam_width` must not be 0.
    pub fn beam_width(mut self, beam_width: usize) -> Result<Self> {
        if beam_width == 0 {
            return Err(ParserError::invalid_argument("beam_width must not be 0"));
        }
        self.beam_width = beam_width;
        Ok(self)
    }

    /// Sets the number of threads scoring the beam.
    ///
    /// # Errors
    ///
    /// `n_threads` must not be 0.
    pub fn n_threads(mut self, n_threads: usize) -> Result<Self> {
        if n_threads == 0 {
            return Err(ParserError::invalid_argument("n_threads must not be 0"));
        }
        self.n_threads = n_threads;
        Ok(self)
    }

    /// Chooses between the dynamic and the static oracle for complete trees.
    /// Partial trees always use the dynamic oracle.
    pub const fn use_dynamic_oracle(mut self, flag: bool) -> Self {
        self.use_dynamic_oracle = flag;
        self
    }

    /// Sets the update strategy.
    pub const fn update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    /// Collapses the oracle set to a random member instead of the best
    /// scoring one when the beam top is not an oracle.
    pub const fn use_random_oracle_selection(mut self, flag: bool) -> Self {
        self.use_random_oracle_selection = flag;
        self
    }

    /// Places the root before the first word instead of after the last one.
    pub const fn root_first(mut self, flag: bool) -> Self {
        self.root_first = flag;
        self
    }

    /// Sets the first iteration, counted from 1, that trains on partial trees.
    pub const fn partial_training_starting_iteration(mut self, iteration: u32) -> Self {
        self.partial_training_starting_iteration = iteration;
        self
    }

    /// Sets the seed of random oracle selection.
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Selects the weights scored during training.
    pub const fn training_weights(mut self, kind: WeightKind) -> Self {
        self.training_weights = kind;
        self
    }

    /// Beam width.
    pub const fn get_beam_width(&self) -> usize {
        self.beam_width
    }

    /// Number of scoring threads.
    pub const fn get_n_threads(&self) -> usize {
        self.n_threads
    }

    /// Whether complete trees use the dynamic oracle.
    pub const fn get_use_dynamic_oracle(&self) -> bool {
        self.use_dynamic_oracle
    }

    /// Update strategy.
    pub const fn get_update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    /// Whether the oracle set collapses to a random member.
    pub const fn get_use_random_oracle_selection(&self) -> bool {
        self.use_random_oracle_selection
    }

    /// Whether the root precedes the words.
    pub const fn get_root_first(&self) -> bool {
        self.root_first
    }

    /// First iteration that trains on partial trees.
    pub const fn get_partial_training_starting_iteration(&self) -> u32 {
        self.partial_training_starting_iteration
    }

    /// Seed of random oracle selection.
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Weights scored during training.
    pub const fn get_training_weights(&self) -> WeightKind {
        self.training_weights
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(64, options.get_beam_width());
        assert_eq!(8, options.get_n_threads());
        assert!(options.get_use_dynamic_oracle());
        assert_eq!(UpdateMode::MaxViolation, options.get_update_mode());
        assert!(!options.get_use_random_oracle_selection());
        assert!(!options.get_root_first());
        assert_eq!(3, options.get_partial_training_starting_iteration());
        assert_eq!(WeightKind::Averaged, options.get_training_weights());
    }

    #[test]
    fn test_validation() {
        assert!(Options::new().beam_width(0).is_err());
        assert!(Options::new().n_threads(0).is_err());
        let options = Options::new()
            .beam_width(1)
            .unwrap()
            .n_threads(2)
            .unwrap()
            .root_first(true);
        assert_eq!(1, options.get_beam_width());
        assert_eq!(2, options.get_n_threads());
        assert!(options.get_root_first());
    }

    #[test]
    fn test_update_mode() {
        assert_eq!(UpdateMode::Early, "early".parse().unwrap());
        assert_eq!(UpdateMode::MaxViolation, "max_violation".parse().unwrap());
        assert!("late".parse::<UpdateMode>().is_err());
        assert_eq!("max_violation", UpdateMode::MaxViolation.to_string());
        assert_eq!(UpdateMode::Early, UpdateMode::from_max_violation(false));
    }
}
