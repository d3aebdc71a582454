use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::{
    config::MuxConfig,
    error::{Error, Result, TopologyError},
    group::MuxCardGroup,
    register::CardImage,
    types::{ChannelAddress, StackStatus},
};

/// A stack of MUX2001 cards daisy-chained on one serial bus.
///
/// All cards in a stack share the data clock (`D_CLK`) and the fault/reset
/// (`nMR`) line. Cards are organised into groups that each have their own latch
/// (`R_CLK`) line, and only one channel per group may be active at once.
///
/// Groups and cards are numbered from 1, matching the schematic. Group 1 is the
/// farthest from the bus controller since it receives the first bytes written,
/// and the last group added is the nearest.
///
/// You can create a `MuxStack` from:
/// * a byte transport implementing [`embedded_io::Write`], see
///   [`SpiTransport`](crate::transport::SpiTransport) to use an SPI bus,
/// * an [`InputPin`] reading `nMR` (high = OK, low = fault),
/// * one [`OutputPin`] per group driving `R_CLK`,
/// * a [`DelayNs`] provider used for the latch and settle timing.
///
/// `G`, `C` and `P` bound the number of groups, the cards per group and the total
/// payload in bytes (3 per card).
///
/// Every operation that changes a register runs the full commit sequence before
/// returning: all latch lines low, wait, shift the whole payload, all latch lines
/// high, wait, sample `nMR`. The call blocks for the whole sequence. The stack
/// has no locking of its own, share it between threads behind a single mutex.
pub struct MuxStack<S, F, L, D, const G: usize = 4, const C: usize = 16, const P: usize = 192> {
    bus: S,
    fault: F,
    delay: D,
    config: MuxConfig,
    groups: heapless::Vec<MuxCardGroup<L, C>, G>,
    /// Bytes shifted out by the last commit.
    payload: heapless::Vec<u8, P>,
}

impl<S, F, L, D, const G: usize, const C: usize, const P: usize> MuxStack<S, F, L, D, G, C, P>
where
    S: embedded_io::Write,
    F: InputPin,
    L: OutputPin,
    D: DelayNs,
{
    /// Create an empty stack with default timing.
    pub fn new(bus: S, fault: F, delay: D) -> Self {
        Self::with_config(bus, fault, delay, MuxConfig::default())
    }

    pub fn with_config(bus: S, fault: F, delay: D, config: MuxConfig) -> Self {
        Self {
            bus,
            fault,
            delay,
            config,
            groups: heapless::Vec::new(),
            payload: heapless::Vec::new(),
        }
    }

    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// Register a group of `card_count` cards sharing the latch line `latch`.
    ///
    /// The group is appended nearest to the bus controller, after every group
    /// added before it. Returns the group's number. Its cards start cleared but
    /// nothing is sent to the hardware until the next commit, so follow the last
    /// `add_group` with [`Self::clear_all`].
    pub fn add_group(&mut self, card_count: u32, latch: L) -> Result<u32, S::Error> {
        if self.groups.is_full() {
            return Err(TopologyError::TooManyGroups(G).into());
        }

        let group = MuxCardGroup::new(card_count, latch)?;
        let required = self.payload_len() + group.payload_len();
        if required > P {
            return Err(TopologyError::PayloadTooLarge {
                required,
                capacity: P,
            }
            .into());
        }

        if self.groups.push(group).is_err() {
            return Err(TopologyError::TooManyGroups(G).into());
        }

        let number = self.groups.len() as u32;
        debug!("mux: added group {} with {} cards", number, card_count);
        Ok(number)
    }

    /// Clear every card in every group and commit.
    pub fn clear_all(&mut self) -> Result<StackStatus, S::Error> {
        self.groups.iter_mut().for_each(MuxCardGroup::clear);
        self.commit()
    }

    /// Clear every card in one group and commit. The other groups keep their
    /// selection, and are re-sent unchanged.
    pub fn clear_group(&mut self, group: u32) -> Result<StackStatus, S::Error> {
        let index = self.group_index(group)?;
        self.groups[index].clear();
        self.commit()
    }

    /// Select channel `(positive, negative)` on `card` of `group` and commit.
    ///
    /// Every other card in the same group is cleared. Single-ended channels use
    /// `negative = 0`, differential pairs use an odd `positive` with
    /// `negative = positive + 1`, and `positive = 21` selects the current channel.
    ///
    /// A pin pair that matches none of those clears the group, unless the stack
    /// was configured with [`MuxConfig::reject_unrecognized`].
    pub fn set_channel(
        &mut self,
        group: u32,
        card: u32,
        positive: u8,
        negative: u8,
    ) -> Result<StackStatus, S::Error> {
        self.select(ChannelAddress::new(group, card, positive, negative))
    }

    /// Same as [`Self::set_channel`], taking the whole address at once.
    pub fn select(&mut self, address: impl Into<ChannelAddress>) -> Result<StackStatus, S::Error> {
        let address = address.into();
        let group = self.group_index(address.group)?;
        let card = self.card_index(group, address.card)?;

        if address.kind().is_none() {
            if self.config.rejects_unrecognized() {
                return Err(Error::UnrecognizedChannel(address));
            }
            warn!(
                "mux: pins {}-{} select nothing, clearing group {}",
                address.positive,
                address.negative,
                address.group
            );
        }

        if let Some(kind) = self.groups[group].select(card, address.positive, address.negative)? {
            debug!(
                "mux: group {} card {} selected {}",
                address.group,
                address.card,
                <&'static str>::from(kind)
            );
        }
        self.commit()
    }

    /// Sample the `nMR` line without touching the cards.
    pub fn read_status(&mut self) -> Result<StackStatus, S::Error> {
        let high = self.fault.is_high().map_err(Error::fault_sense)?;
        Ok(StackStatus::from(high))
    }

    /// Bytes shifted out by the last commit, first byte first.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn group_count(&self) -> u32 {
        self.groups.len() as u32
    }

    pub fn group(&self, group: u32) -> Option<&MuxCardGroup<L, C>> {
        let index = group.checked_sub(1)?;
        self.groups.get(index as usize)
    }

    /// Current register image of one card.
    pub fn card_image(&self, group: u32, card: u32) -> Result<CardImage, S::Error> {
        let group = self.group_index(group)?;
        let card = self.card_index(group, card)?;
        Ok(self.groups[group].image(card).unwrap_or_default())
    }

    /// Destroy the stack, returning the bus, the fault pin, the delay and the
    /// latch pins in group order.
    pub fn release(self) -> (S, F, D, heapless::Vec<L, G>) {
        let latches = self.groups.into_iter().map(MuxCardGroup::release).collect();
        (self.bus, self.fault, self.delay, latches)
    }

    fn payload_len(&self) -> usize {
        self.groups.iter().map(MuxCardGroup::payload_len).sum()
    }

    fn group_index(&self, group: u32) -> core::result::Result<usize, TopologyError> {
        let groups = self.groups.len();
        group
            .checked_sub(1)
            .map(|index| index as usize)
            .filter(|&index| index < groups)
            .ok_or(TopologyError::NoSuchGroup {
                group,
                groups: groups as u32,
            })
    }

    fn card_index(&self, group: usize, card: u32) -> core::result::Result<usize, TopologyError> {
        let cards = self.groups[group].card_count();
        card.checked_sub(1)
            .map(|index| index as usize)
            .filter(|&index| index < cards)
            .ok_or(TopologyError::NoSuchCard {
                card,
                cards: cards as u32,
            })
    }

    /// Shift the register state of every group out to the cards.
    ///
    /// Register state is never rolled back: if a collaborator fails part way the
    /// error is returned with the lines left where that step put them.
    fn commit(&mut self) -> Result<StackStatus, S::Error> {
        self.payload.clear();
        for group in self.groups.iter() {
            for byte in group.payload() {
                self.payload
                    .push(byte)
                    .map_err(|_| TopologyError::PayloadTooLarge {
                        required: self.groups.iter().map(MuxCardGroup::payload_len).sum(),
                        capacity: P,
                    })?;
            }
        }

        // Low clears the cards immediately, whatever they were latched to.
        self.write_latches(PinState::Low)?;
        self.delay.delay_ms(self.config.timing().latch_low().to_millis());

        // An empty stack still hands the transport one (empty) transfer.
        if self.payload.is_empty() {
            self.bus.write(&[]).map_err(Error::Bus)?;
        } else {
            self.bus.write_all(&self.payload).map_err(Error::Bus)?;
        }
        self.bus.flush().map_err(Error::Bus)?;

        // Rising edge after the low period clocks the new data into the relays.
        self.write_latches(PinState::High)?;
        self.delay.delay_ms(self.config.timing().settle().to_millis());

        let status = self.read_status()?;
        trace!("mux: committed {} bytes, status {}", self.payload.len(), status);
        if status.is_fault() {
            warn!("mux: nMR low after commit");
        }
        Ok(status)
    }

    fn write_latches(&mut self, state: PinState) -> Result<(), S::Error> {
        for (index, group) in self.groups.iter_mut().enumerate() {
            group
                .write_latch(state)
                .map_err(|err| Error::latch(index, err))?;
        }
        Ok(())
    }
}
