//! Our error types for the MUX2001 stack.

use embedded_hal::digital;
use thiserror::Error;

use crate::types::ChannelAddress;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for MUX2001 stack operations.
///
/// `I` is the error type of the byte transport.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial bus error")]
    Bus(I),
    #[error("Failed to drive latch line of group {group}: {kind:?}")]
    Latch { group: u32, kind: digital::ErrorKind },
    #[error("Failed to read fault line: {0:?}")]
    FaultSense(digital::ErrorKind),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("Pin pair {}-{} does not select a channel", .0.positive, .0.negative)]
    UnrecognizedChannel(ChannelAddress),
}

/// Addressing and capacity problems. These are caller bugs, and are reported
/// before any register state or bus line is touched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TopologyError {
    #[error("Group {group} does not exist, stack has {groups} groups")]
    NoSuchGroup { group: u32, groups: u32 },
    #[error("Card {card} does not exist, group has {cards} cards")]
    NoSuchCard { card: u32, cards: u32 },
    #[error("A card group needs at least one card")]
    EmptyGroup,
    #[error("Stack already holds the maximum of {0} groups")]
    TooManyGroups(usize),
    #[error("Group of {requested} cards exceeds the maximum of {max}")]
    TooManyCards { requested: u32, max: usize },
    #[error("Payload of {required} bytes exceeds the buffer of {capacity} bytes")]
    PayloadTooLarge { required: usize, capacity: usize },
}

impl<I: embedded_io::Error> Error<I> {
    pub(crate) fn latch(group: usize, err: impl digital::Error) -> Self {
        Error::Latch {
            group: group as u32 + 1,
            kind: err.kind(),
        }
    }

    pub(crate) fn fault_sense(err: impl digital::Error) -> Self {
        Error::FaultSense(err.kind())
    }
}
