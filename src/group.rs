//! A group of cards that share one latch (`R_CLK`) line.
//!
//! All cards of a group are cleared together and at most one of them has a
//! channel selected at any time. Cards are stored in daisy-chain order: card 1
//! is farthest from the bus controller and its bytes are shifted out first.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::TopologyError;
use crate::register::{CardImage, CardRegister, IMAGE_LEN};
use crate::types::ChannelKind;

/// Up to `C` cards behind one latch line, in daisy-chain order.
pub struct MuxCardGroup<L, const C: usize> {
    latch: L,
    cards: heapless::Vec<CardRegister, C>,
}

impl<L: OutputPin, const C: usize> MuxCardGroup<L, C> {
    /// Create a group of `card_count` cleared cards.
    pub fn new(card_count: u32, latch: L) -> Result<Self, TopologyError> {
        if card_count == 0 {
            return Err(TopologyError::EmptyGroup);
        }

        let mut cards = heapless::Vec::new();
        for _ in 0..card_count {
            cards
                .push(CardRegister::new())
                .map_err(|_| TopologyError::TooManyCards {
                    requested: card_count,
                    max: C,
                })?;
        }

        Ok(Self { latch, cards })
    }

    /// Number of cards in the group.
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Number of bytes this group contributes to the bus payload.
    pub fn payload_len(&self) -> usize {
        self.cards.len() * IMAGE_LEN
    }

    /// Image of the card at 0-indexed position `card`.
    pub fn image(&self, card: usize) -> Option<CardImage> {
        self.cards.get(card).map(CardRegister::image)
    }

    /// Index of the one card with relays closed, if any.
    pub fn active_card(&self) -> Option<usize> {
        self.cards.iter().position(|card| !card.is_cleared())
    }

    /// The group's bytes in transmission order.
    pub fn payload(&self) -> impl Iterator<Item = u8> + '_ {
        self.cards.iter().flat_map(CardRegister::bytes)
    }

    pub(crate) fn clear(&mut self) {
        self.cards.iter_mut().for_each(CardRegister::clear);
    }

    /// Clear the group, then select `(positive, negative)` on the 0-indexed `card`.
    ///
    /// The index is checked before anything is cleared.
    pub(crate) fn select(
        &mut self,
        card: usize,
        positive: u8,
        negative: u8,
    ) -> Result<Option<ChannelKind>, TopologyError> {
        if card >= self.cards.len() {
            return Err(TopologyError::NoSuchCard {
                card: card as u32 + 1,
                cards: self.cards.len() as u32,
            });
        }

        self.clear();
        Ok(self.cards[card].select(positive, negative))
    }

    /// Drive the latch line. Low makes the cards transparent and opens every
    /// relay in the group, high latches the shifted data.
    pub(crate) fn write_latch(&mut self, state: PinState) -> Result<(), L::Error> {
        self.latch.set_state(state)
    }

    pub(crate) fn release(self) -> L {
        self.latch
    }

    #[cfg(test)]
    pub(crate) fn latch_mut(&mut self) -> &mut L {
        &mut self.latch
    }
}
