//! We use this mocking module in unit tests to emulate the bus, the control
//! lines and the delay provider of a stack.
//!
//! Every mock can share a [`Journal`] so tests can assert the order in which the
//! driver touched each collaborator.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::spi::{self, SpiBus};
use embedded_hal::{delay::DelayNs, digital};

/// Something a collaborator observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Latch line of group `group` (0-indexed registration order) driven.
    Latch { group: usize, high: bool },
    /// Bytes handed to the transport in one `write` call.
    Write(Vec<u8>),
    Flush,
    /// Fault line sampled, with the level returned.
    ReadFault(bool),
    DelayMs(u32),
    DelayNs(u32),
}

/// Shared, ordered record of events.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Every payload written, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBusError {
    /// Simulated failure of the bus peripheral.
    SimulatedError,
}

impl core::fmt::Display for MockBusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "simulated bus error")
    }
}

impl core::error::Error for MockBusError {}

impl embedded_io::Error for MockBusError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// Byte transport that records everything written to it.
#[derive(Debug, Default)]
pub struct MockBus {
    journal: Journal,
    written: Vec<u8>,
    should_error_on_write: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Self::default()
        }
    }

    /// All bytes written so far, across every transfer.
    pub fn written_data(&self) -> &[u8] {
        &self.written
    }

    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }
}

impl embedded_io::ErrorType for MockBus {
    type Error = MockBusError;
}

impl embedded_io::Write for MockBus {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockBusError::SimulatedError);
        }
        self.written.extend_from_slice(buf);
        self.journal.push(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockBusError::SimulatedError);
        }
        self.journal.push(Event::Flush);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Latch line output that remembers every level it was driven to.
#[derive(Debug, Default)]
pub struct MockLatch {
    group: usize,
    journal: Journal,
    levels: Vec<bool>,
    should_error: bool,
}

impl MockLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// `group` is the 0-indexed group this line is wired to, used to tag journal events.
    pub fn with_journal(group: usize, journal: &Journal) -> Self {
        Self {
            group,
            journal: journal.clone(),
            ..Self::default()
        }
    }

    pub fn levels(&self) -> &[bool] {
        &self.levels
    }

    pub fn set_error(&mut self, should_error: bool) {
        self.should_error = should_error;
    }

    fn drive(&mut self, high: bool) -> Result<(), MockPinError> {
        if self.should_error {
            return Err(MockPinError);
        }
        self.levels.push(high);
        self.journal.push(Event::Latch {
            group: self.group,
            high,
        });
        Ok(())
    }
}

impl digital::ErrorType for MockLatch {
    type Error = MockPinError;
}

impl digital::OutputPin for MockLatch {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// Fault sense input. Returns the configured level on every read.
#[derive(Debug)]
pub struct MockFault {
    journal: Journal,
    level: bool,
    reads: usize,
    should_error: bool,
}

impl Default for MockFault {
    fn default() -> Self {
        Self {
            journal: Journal::default(),
            level: true,
            reads: 0,
            should_error: false,
        }
    }
}

impl MockFault {
    /// A healthy (high) fault line.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Self::default()
        }
    }

    /// Drive the line low to simulate a fault or external reset.
    pub fn set_level(&mut self, high: bool) {
        self.level = high;
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn set_error(&mut self, should_error: bool) {
        self.should_error = should_error;
    }

    fn sample(&mut self) -> Result<bool, MockPinError> {
        if self.should_error {
            return Err(MockPinError);
        }
        self.reads += 1;
        self.journal.push(Event::ReadFault(self.level));
        Ok(self.level)
    }
}

impl digital::ErrorType for MockFault {
    type Error = MockPinError;
}

impl digital::InputPin for MockFault {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.sample()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.sample().map(|high| !high)
    }
}

/// Delay provider that records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    journal: Journal,
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            total_ns: 0,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.journal.push(Event::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
        self.journal.push(Event::DelayMs(ms));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSpiError;

impl spi::Error for MockSpiError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// SPI bus that records outgoing bytes and clocks in zeros.
#[derive(Debug, Default)]
pub struct MockSpi {
    journal: Journal,
    should_error: bool,
}

impl MockSpi {
    pub fn with_journal(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            should_error: false,
        }
    }

    pub fn set_error(&mut self, should_error: bool) {
        self.should_error = should_error;
    }

    fn check(&self) -> Result<(), MockSpiError> {
        if self.should_error {
            Err(MockSpiError)
        } else {
            Ok(())
        }
    }
}

impl spi::ErrorType for MockSpi {
    type Error = MockSpiError;
}

impl SpiBus<u8> for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.check()?;
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.check()?;
        self.journal.push(Event::Write(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        read.fill(0);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)?;
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.journal.push(Event::Flush);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{InputPin, OutputPin};
    use embedded_io::{Error, Write};

    #[test]
    fn bus_records_writes() {
        let journal = Journal::new();
        let mut bus = MockBus::with_journal(&journal);

        bus.write_all(&[1, 2, 3]).unwrap();
        bus.flush().unwrap();

        assert_eq!(bus.written_data(), [1, 2, 3]);
        assert_eq!(
            journal.events(),
            [Event::Write(std::vec![1, 2, 3]), Event::Flush]
        );
    }

    #[test]
    fn bus_error_simulation() {
        let mut bus = MockBus::new();
        bus.set_write_error(true);

        assert_eq!(bus.write(b"test"), Err(MockBusError::SimulatedError));
        assert!(bus.written_data().is_empty());
        assert!(matches!(
            MockBusError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn latch_and_fault_share_journal() {
        let journal = Journal::new();
        let mut latch = MockLatch::with_journal(2, &journal);
        let mut fault = MockFault::with_journal(&journal);

        latch.set_low().unwrap();
        fault.set_level(false);
        assert!(!fault.is_high().unwrap());
        latch.set_high().unwrap();

        assert_eq!(
            journal.events(),
            [
                Event::Latch { group: 2, high: false },
                Event::ReadFault(false),
                Event::Latch { group: 2, high: true },
            ]
        );
        assert_eq!(latch.levels(), [false, true]);
        assert_eq!(fault.reads(), 1);
    }

    #[test]
    fn pin_error_simulation() {
        let mut latch = MockLatch::new();
        latch.set_error(true);
        assert_eq!(latch.set_high(), Err(MockPinError));
        assert!(latch.levels().is_empty());

        let mut fault = MockFault::new();
        fault.set_error(true);
        assert_eq!(fault.is_high(), Err(MockPinError));
    }

    #[test]
    fn delay_records_milliseconds() {
        let journal = Journal::new();
        let mut delay = MockDelay::with_journal(&journal);
        delay.delay_ms(40);
        delay.delay_ms(5);
        assert_eq!(delay.total_ms(), 45);
        assert_eq!(journal.events(), [Event::DelayMs(40), Event::DelayMs(5)]);
    }
}
