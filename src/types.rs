//! This module contains the value types used to address channels on a stack.

use core::str::FromStr;

use strum_macros::{EnumIter, IntoStaticStr};
use thiserror::Error;

/// Pin number of the common input, `V_CH_COM` on the schematic.
pub const COMMON_PIN: u8 = 0;

/// Pin number of the current channel, `I_CH_21+`/`I_CH_21-` combined on the schematic.
pub const CURRENT_PIN: u8 = 21;

/// Highest voltage channel on a card.
pub const LAST_VOLTAGE_PIN: u8 = 20;

/// The measurement paths a card can be switched into.
#[derive(Debug, EnumIter, IntoStaticStr, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelKind {
    /// Channel 21, routed onto the current measurement path.
    CurrentSense,
    /// Odd channel `n` measured against channel `n + 1`.
    Differential,
    /// Channel 1-20 measured against the common input.
    SingleEnded,
}

impl ChannelKind {
    /// Work out which measurement path a `(positive, negative)` pin pair selects.
    ///
    /// Returns `None` for pairs the card has no relay pattern for. Those pairs
    /// encode to a cleared card, so checking here is the only way to tell a
    /// mistyped channel apart from a deliberate clear.
    pub fn classify(positive: u8, negative: u8) -> Option<Self> {
        if positive == CURRENT_PIN {
            Some(Self::CurrentSense)
        } else if positive % 2 == 1 && (1..=19).contains(&positive) && negative == positive + 1 {
            Some(Self::Differential)
        } else if negative == COMMON_PIN && (1..=LAST_VOLTAGE_PIN).contains(&positive) {
            Some(Self::SingleEnded)
        } else {
            None
        }
    }
}

/// A channel on the stack, numbered the way the schematic and PCB labels are.
///
/// `group` and `card` are 1-indexed. Card numbering restarts in every group, so
/// `(group=1, card=1)` and `(group=2, card=1)` are different cards.
///
/// ```
/// use mux2001::types::ChannelAddress;
///
/// // group 1, card 1, channel 5 single-ended
/// const DMM_VCC: ChannelAddress = ChannelAddress::new(1, 1, 5, 0);
/// // group 1, card 1, channel 5 to 6 differential
/// const DMM_VCC_SHUNT: ChannelAddress = ChannelAddress::new(1, 1, 5, 6);
///
/// assert_eq!("1, 1, 5, 0".parse::<ChannelAddress>(), Ok(DMM_VCC));
/// assert_eq!("(1,1,5,6)".parse::<ChannelAddress>(), Ok(DMM_VCC_SHUNT));
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelAddress {
    /// Card group, 1 is farthest from the bus controller.
    pub group: u32,
    /// Card within the group, 1 is farthest from the bus controller.
    pub card: u32,
    /// Positive input pin, 0-21.
    pub positive: u8,
    /// Negative input pin, 0-21.
    pub negative: u8,
}

impl ChannelAddress {
    pub const fn new(group: u32, card: u32, positive: u8, negative: u8) -> Self {
        Self {
            group,
            card,
            positive,
            negative,
        }
    }

    /// Measurement path selected by this address, if the pin pair is valid.
    pub fn kind(&self) -> Option<ChannelKind> {
        ChannelKind::classify(self.positive, self.negative)
    }
}

impl From<(u32, u32, u8, u8)> for ChannelAddress {
    fn from((group, card, positive, negative): (u32, u32, u8, u8)) -> Self {
        Self::new(group, card, positive, negative)
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddressParseError {
    #[error("Expected four comma separated fields: group, card, positive, negative")]
    WrongFieldCount,
    #[error("Field {0} is not a valid number")]
    InvalidNumber(usize),
}

impl FromStr for ChannelAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(s);

        let mut values = [0u32; 4];
        let mut fields = s.split(',');
        for (index, value) in values.iter_mut().enumerate() {
            let field = fields.next().ok_or(AddressParseError::WrongFieldCount)?;
            *value = field
                .trim()
                .parse()
                .map_err(|_| AddressParseError::InvalidNumber(index))?;
        }
        if fields.next().is_some() {
            return Err(AddressParseError::WrongFieldCount);
        }

        let [group, card, positive, negative] = values;
        let positive = u8::try_from(positive).map_err(|_| AddressParseError::InvalidNumber(2))?;
        let negative = u8::try_from(negative).map_err(|_| AddressParseError::InvalidNumber(3))?;

        Ok(Self::new(group, card, positive, negative))
    }
}

/// Health of the stack as reported by the fault-sense (`nMR`) line.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackStatus {
    /// Line is high, no card is signalling a fault.
    #[default]
    Healthy = 0x01,
    /// Line is pulled low by a card fault or an external reset.
    Fault = 0x00,
}

impl StackStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_fault(&self) -> bool {
        !self.is_healthy()
    }
}

impl From<StackStatus> for bool {
    fn from(value: StackStatus) -> Self {
        match value {
            StackStatus::Fault => false,
            StackStatus::Healthy => true,
        }
    }
}

impl From<bool> for StackStatus {
    fn from(value: bool) -> Self {
        match value {
            true => StackStatus::Healthy,
            false => StackStatus::Fault,
        }
    }
}
