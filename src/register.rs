//! This module defines the output register image of a single MUX2001 card and
//! the mapping from a pin pair onto that image.
//!
//! Each card carries three daisy-chained 8-bit shift registers. The first byte
//! shifted in for a card drives the pair-select relays of channels 1-10, the
//! second those of channels 11-20 plus the current channel, and the third routes
//! the selected pair onto the measurement or common bus.

use modular_bitfield::prelude::*;

use crate::types::{COMMON_PIN, CURRENT_PIN, ChannelKind};

/// Pair-select bit for each of the five relay pairs in one bank.
///
/// Indexed by `(pin - bank_offset - 1) / 2`, so pins 1 and 2 share entry 0,
/// pins 3 and 4 share entry 1, and so on.
pub const PAIR_SELECT: [u8; 5] = [0x80, 0x40, 0x10, 0x08, 0x04];

/// Byte 1: routes channel 21 onto the current measurement path.
pub const CURRENT_SENSE: u8 = 0x02;
/// Byte 2: connects both sides of the selected pair to the common bus.
pub const AB_TO_COMMON: u8 = 0x10;
/// Byte 2: connects the A (odd) side of the selected pair to the measurement bus.
pub const A_TO_MEAS: u8 = 0x08;
/// Byte 2: connects the B (even) side of the selected pair to the measurement bus.
pub const B_TO_MEAS: u8 = 0x04;

/// Size of one card's register image on the bus.
pub const IMAGE_LEN: usize = 3;

/// The 3-byte register image of one card, one flag per relay.
///
/// Byte 0 is the first byte shifted out for the card. An all-zero image opens
/// every relay on the card.
#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardImage {
    // byte 0: channels 1-10
    #[skip]
    __: B2,
    pub pair_9_10: bool,
    pub pair_7_8: bool,
    pub pair_5_6: bool,
    #[skip]
    __: B1,
    pub pair_3_4: bool,
    pub pair_1_2: bool,
    // byte 1: channels 11-21
    #[skip]
    __: B1,
    pub current_sense: bool,
    pub pair_19_20: bool,
    pub pair_17_18: bool,
    pub pair_15_16: bool,
    #[skip]
    __: B1,
    pub pair_13_14: bool,
    pub pair_11_12: bool,
    // byte 2: routing
    #[skip]
    __: B2,
    pub b_to_meas: bool,
    pub a_to_meas: bool,
    pub ab_to_common: bool,
    #[skip]
    __: B3,
}

impl Default for CardImage {
    fn default() -> Self {
        Self::new()
    }
}

impl CardImage {
    /// Whether every relay on the card is open.
    pub fn is_cleared(&self) -> bool {
        self.into_bytes() == [0x00; IMAGE_LEN]
    }

    /// Encode a `(positive, negative)` pin pair.
    ///
    /// Pairs that [`ChannelKind::classify`] does not recognise produce a
    /// cleared image rather than an error.
    pub fn encode(positive: u8, negative: u8) -> Self {
        let mut bytes = [0x00; IMAGE_LEN];

        match ChannelKind::classify(positive, negative) {
            Some(ChannelKind::CurrentSense) => {
                bytes[1] = CURRENT_SENSE;
            }
            Some(ChannelKind::Differential) => {
                bytes[2] = AB_TO_COMMON;
                select_pair(&mut bytes, positive);
            }
            Some(ChannelKind::SingleEnded) => {
                debug_assert_eq!(negative, COMMON_PIN);
                bytes[2] = if positive % 2 == 1 { A_TO_MEAS } else { B_TO_MEAS };
                select_pair(&mut bytes, positive);
            }
            None => {}
        }

        Self::from_bytes(bytes)
    }
}

/// Set the pair-select bit for `pin` in whichever bank holds it.
fn select_pair(bytes: &mut [u8; IMAGE_LEN], pin: u8) {
    debug_assert!((1..CURRENT_PIN).contains(&pin));
    let (byte, offset) = if pin <= 10 { (0, 0) } else { (1, 10) };
    bytes[byte] |= PAIR_SELECT[usize::from((pin - offset - 1) / 2)];
}

/// Register state held for one card in a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardRegister {
    image: CardImage,
}

impl CardRegister {
    /// A card with every relay open.
    pub fn new() -> Self {
        Self::default()
    }

    /// The card's relay image, one named flag per relay.
    pub fn image(&self) -> CardImage {
        self.image
    }

    /// The 3 bytes shifted out for this card, byte 0 first.
    pub fn bytes(&self) -> [u8; IMAGE_LEN] {
        self.image.into_bytes()
    }

    /// Whether every relay on this card is open.
    pub fn is_cleared(&self) -> bool {
        self.image.is_cleared()
    }

    /// Open every relay on this card.
    pub fn clear(&mut self) {
        self.image = CardImage::new();
    }

    /// Replace the image with the encoding of `(positive, negative)`.
    ///
    /// Returns the measurement path selected, or `None` when the pair was not
    /// recognised and the card has been left cleared.
    pub fn select(&mut self, positive: u8, negative: u8) -> Option<ChannelKind> {
        self.image = CardImage::encode(positive, negative);
        ChannelKind::classify(positive, negative)
    }
}
