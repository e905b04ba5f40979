use core::fmt;

use bincode::{Decode, Encode};

/// Transition of the Arc-Eager system.
///
/// The variant order defines the tie-breaking order of candidates with equal
/// scores: earlier variants and smaller labels win.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Decode, Encode)]
pub enum Action {
    /// Moves the buffer head onto the stack.
    Shift,

    /// Pops the stack top.
    Reduce,

    /// Moves the stack top back to the buffer head.
    Unshift,

    /// Attaches the buffer head to the stack top with the given label and
    /// pushes it.
    RightArc(u32),

    /// Attaches the stack top to the buffer head with the given label and pops
    /// it.
    LeftArc(u32),
}

impl Action {
    /// Returns the label carried by an arc action.
    #[inline(always)]
    pub const fn label(self) -> Option<u32> {
        match self {
            Self::RightArc(label) | Self::LeftArc(label) => Some(label),
            Self::Shift | Self::Reduce | Self::Unshift => None,
        }
    }

    /// Returns `true` if the action creates an arc.
    #[inline(always)]
    pub const fn is_arc(self) -> bool {
        matches!(self, Self::RightArc(_) | Self::LeftArc(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Shift => write!(f, "SH"),
            Self::Reduce => write!(f, "RD"),
            Self::Unshift => write!(f, "US"),
            Self::RightArc(label) => write!(f, "RA({label})"),
            Self::LeftArc(label) => write!(f, "LA({label})"),
        }
    }
}
