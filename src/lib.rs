//! This crate provides a driver for stacks of MUX2001 relay multiplexer cards.
//!
//! It supports `no-std` environments by use of the `no-std` feature flag, and never allocates.
//!
//! Each card has 20 voltage channels, a common channel and a current channel. Cards are
//! daisy-chained on one serial bus, shifting 3 bytes per card, and are organised like so:
//! * Stack: every card on the same bus. All share `D_CLK`, `D_IN` and the `nMR` fault line.
//! * Card group: cards that share one `R_CLK` latch line. Only one channel in a group is
//!   active at a time.
//! * Card: a single physical card, numbered from 1 within its group.
//! * Channel: a `(positive, negative)` pin pair on one card.
//!   * `(n, 0)` - channel 1-20 single-ended against `V_CH_COM`.
//!   * `(n, n + 1)` - odd channel `n` differential against `n + 1`.
//!   * `(21, _)` - the current channel.
//!
//! Group 1 and card 1 are the farthest from the bus controller, since they receive the first
//! bytes written.
//!
//! The driver only needs a byte transport ([`embedded_io::Write`], or an SPI bus through
//! [`transport::SpiTransport`]), an input pin for `nMR`, an output pin per group for `R_CLK`
//! and a delay provider, so it runs on anything with `embedded-hal` 1.0 support.
//!
//! The SPI bus used for the cards should be configured like so:
//! * Mode 0 (CPOL = 0, CPHA = 0)
//! * Clock idle low
//! * MSB first
//! * 100 kHz clock, as used by the reference host setup

#![cfg_attr(all(feature = "no-std", not(test)), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod group;
pub mod register;
pub mod stack;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock;

pub use config::MuxConfig;
pub use error::{Error, TopologyError};
pub use stack::MuxStack;
pub use types::{ChannelAddress, ChannelKind, StackStatus};
