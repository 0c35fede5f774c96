//! UART serial communication abstractions
//!
//! Non-blocking byte transfer: both directions move whatever the
//! peripheral can handle right now and report how much that was. A main
//! loop calls them repeatedly; nothing here waits for the line.

/// Error type shared by both directions of a peripheral
pub trait ErrorType {
    type Error;
}

/// UART transmitter
pub trait UartTx: ErrorType {
    /// Hand bytes to the transmitter
    ///
    /// Returns how many leading bytes of `data` were accepted, which may be
    /// zero when the transmit FIFO is full.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx: ErrorType {
    /// Copy bytes that have already arrived into `buf`
    ///
    /// Returns the number of bytes copied, zero if nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single pending byte, if any
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Create an 8N1 configuration at the given baud rate
    pub fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            ..Self::default()
        }
    }

    /// Bits on the line per transferred byte (start + data + parity + stop)
    pub fn bits_per_byte(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }

    /// Time to put `bytes` bytes on the line, in microseconds (rounded up)
    pub fn transfer_time_us(&self, bytes: usize) -> u64 {
        let bits = bytes as u64 * self.bits_per_byte() as u64;
        let baud = self.baudrate.max(1) as u64;
        (bits * 1_000_000).div_ceil(baud)
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
