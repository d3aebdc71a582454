//! Walk through the channels of a stack of MUX2001 cards.
//!
//! This runs against a virtual stack that prints every bus transfer and latch edge,
//! so it works without hardware. To drive real cards, replace `ConsoleBus`,
//! `ConsoleLatch` and `ConsoleFault` with your platform's SPI bus and GPIO pins.

use std::convert::Infallible;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use inquire::{Select, Text};
use mux2001::{ChannelAddress, MuxStack};

// Configuration constants - adjust these for your setup
const NUM_MUX_CARDS: u32 = 10;
const DWELL_MS: u64 = 50;
const PAUSE_MS: u64 = 500;

/// Prints each payload instead of shifting it out.
pub struct ConsoleBus;

impl embedded_io::ErrorType for ConsoleBus {
    type Error = Infallible;
}

impl embedded_io::Write for ConsoleBus {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let bytes: Vec<String> = buf.iter().map(|b| format!("{b:02X}")).collect();
        println!("  D_IN  <- {}", bytes.join(" "));
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Prints the R_CLK edges of one group.
pub struct ConsoleLatch(u32);

impl ErrorType for ConsoleLatch {
    type Error = Infallible;
}

impl OutputPin for ConsoleLatch {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        println!("  R_CLK{} low", self.0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        println!("  R_CLK{} high", self.0);
        Ok(())
    }
}

/// nMR with nothing pulling it low.
pub struct ConsoleFault;

impl ErrorType for ConsoleFault {
    type Error = Infallible;
}

impl InputPin for ConsoleFault {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
}

type Stack = MuxStack<ConsoleBus, ConsoleFault, ConsoleLatch, StdDelay>;

const SWEEPS: [&str; 4] = [
    "Single-ended, every channel",
    "Differential, every pair",
    "Current channel, every card",
    "Enter a channel",
];

fn select(stack: &mut Stack, address: ChannelAddress) {
    println!(
        "({}, {}, {}, {})",
        address.group, address.card, address.positive, address.negative
    );
    let status = stack.select(address).expect("Failed to select channel");
    if status.is_fault() {
        println!("  nMR low: card fault or external reset");
    }
    std::thread::sleep(Duration::from_millis(DWELL_MS));
}

fn main() {
    let mut stack: Stack = MuxStack::new(ConsoleBus, ConsoleFault, StdDelay);

    // One group of parallel cards, then make sure every relay starts open.
    stack
        .add_group(NUM_MUX_CARDS, ConsoleLatch(1))
        .expect("Failed to add card group");
    stack.clear_all().expect("Failed to clear stack");

    let sweep = Select::new("Select a sweep:", SWEEPS.to_vec())
        .prompt()
        .expect("Failed to select sweep");

    match SWEEPS.iter().position(|s| *s == sweep) {
        Some(0) => {
            for card in 1..=NUM_MUX_CARDS {
                for ch in 1..=20 {
                    select(&mut stack, ChannelAddress::new(1, card, ch, 0));
                }
            }
        }
        Some(1) => {
            for card in 1..=NUM_MUX_CARDS {
                for ch in (1..=19).step_by(2) {
                    select(&mut stack, ChannelAddress::new(1, card, ch, ch + 1));
                }
            }
        }
        Some(2) => {
            for card in 1..=NUM_MUX_CARDS {
                select(&mut stack, ChannelAddress::new(1, card, 21, 21));
            }
        }
        _ => {
            let address: ChannelAddress = Text::new("Channel (group, card, positive, negative):")
                .prompt()
                .expect("Failed to read channel")
                .parse()
                .expect("Invalid channel address");
            if address.kind().is_none() {
                println!("Pin pair does not select a channel, the card will be cleared");
            }
            select(&mut stack, address);
        }
    }

    std::thread::sleep(Duration::from_millis(PAUSE_MS));
    stack.clear_all().expect("Failed to clear stack");
    println!("Done, all relays open.");
}
