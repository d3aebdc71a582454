//! Adapter from an `embedded-hal` SPI bus onto the byte transport the stack writes to.
//!
//! The cards only listen on `D_CLK`/`D_IN`, so any SPI mode 0 bus with MOSI and
//! SCK wired up will do. Nothing is read back.

use embedded_hal::spi::{self, SpiBus};

/// Error from the wrapped SPI bus.
#[derive(Debug)]
pub struct SpiTransportError<E>(pub E);

impl<E: spi::Error> embedded_io::Error for SpiTransportError<E> {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for SpiTransportError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SPI bus error: {:?}", self.0)
    }
}

impl<E: core::fmt::Debug> core::error::Error for SpiTransportError<E> {}

/// Byte transport that shifts data out on an SPI bus.
///
/// Each write is flushed before returning, so the last clock edge has gone out by
/// the time the stack raises the latch lines.
#[derive(Debug)]
pub struct SpiTransport<B> {
    bus: B,
}

impl<B: SpiBus<u8>> SpiTransport<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Get the SPI bus back.
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: SpiBus<u8>> embedded_io::ErrorType for SpiTransport<B> {
    type Error = SpiTransportError<B::Error>;
}

impl<B: SpiBus<u8>> embedded_io::Write for SpiTransport<B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.bus.write(buf).map_err(SpiTransportError)?;
        self.bus.flush().map_err(SpiTransportError)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.bus.flush().map_err(SpiTransportError)
    }
}
