//! UART link
//!
//! Connects a byte transport to the packet protocol. Received bytes are
//! queued in an RX ring (typically from the UART interrupt) and later
//! drained into a [`Receiver`] from the main loop. Outgoing packets are
//! serialized whole into a TX ring and trickled out to the transport as
//! it accepts bytes.

use amcom_hal::{Uart, UartTx};
use amcom_protocol::{serialize_bounded, PacketHandler, Receiver, SerializeError, HEADER_SIZE};

use crate::ring_buffer::RingBuffer;

/// Largest packet any receiver configuration can produce
const FRAME_BUF_SIZE: usize = HEADER_SIZE + u8::MAX as usize;

/// Bytes moved from the transport per read
const RX_SCRATCH_SIZE: usize = 32;

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Packet could not be serialized
    Serialize(SerializeError),
    /// Not enough room in the TX ring for the whole packet
    TxFull,
}

impl From<SerializeError> for LinkError {
    fn from(e: SerializeError) -> Self {
        LinkError::Serialize(e)
    }
}

/// Link traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Bytes accepted into the RX ring
    pub rx_bytes: u32,
    /// Bytes lost because the RX ring was full
    pub rx_overruns: u32,
    /// Packets queued for transmission
    pub tx_packets: u32,
    /// Packets refused because the TX ring was full
    pub tx_rejected: u32,
    /// Bytes handed to the transport
    pub tx_bytes: u32,
}

/// Packet link with an `RX`-byte receive ring and a `TX`-byte transmit ring
pub struct Link<H, const RX: usize, const TX: usize, const N: usize> {
    rx: RingBuffer<RX>,
    tx: RingBuffer<TX>,
    receiver: Receiver<H, N>,
    stats: LinkStats,
}

impl<H, const RX: usize, const TX: usize, const N: usize> Link<H, RX, TX, N>
where
    H: PacketHandler<N>,
{
    pub const fn new(receiver: Receiver<H, N>) -> Self {
        Self {
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            receiver,
            stats: LinkStats {
                rx_bytes: 0,
                rx_overruns: 0,
                tx_packets: 0,
                tx_rejected: 0,
                tx_bytes: 0,
            },
        }
    }

    /// Queue one received byte; returns false on overrun
    pub fn on_rx_byte(&mut self, byte: u8) -> bool {
        if self.rx.put(byte) {
            self.stats.rx_bytes = self.stats.rx_bytes.wrapping_add(1);
            true
        } else {
            self.stats.rx_overruns = self.stats.rx_overruns.wrapping_add(1);
            false
        }
    }

    /// Queue received bytes, returning how many fit
    pub fn on_rx(&mut self, bytes: &[u8]) -> usize {
        let accepted = self.rx.write(bytes);
        let lost = bytes.len() - accepted;
        self.stats.rx_bytes = self.stats.rx_bytes.wrapping_add(accepted as u32);
        if lost > 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("RX overrun: {} bytes lost", lost);
            self.stats.rx_overruns = self.stats.rx_overruns.wrapping_add(lost as u32);
        }
        accepted
    }

    /// Drain the RX ring into the receiver, returning bytes processed
    ///
    /// Packet handlers run from here.
    pub fn process_rx(&mut self) -> usize {
        let mut count = 0;
        while let Some(byte) = self.rx.get() {
            self.receiver.feed_byte(byte);
            count += 1;
        }
        count
    }

    /// Serialize a packet and queue it for transmission
    ///
    /// The packet is queued whole or not at all. Returns its size in bytes.
    pub fn send(&mut self, packet_type: u8, payload: &[u8]) -> Result<usize, LinkError> {
        let mut frame = [0u8; FRAME_BUF_SIZE];
        let len = serialize_bounded::<N>(packet_type, payload, &mut frame)?;

        if self.tx.free() < len {
            #[cfg(feature = "defmt")]
            defmt::debug!("TX ring full, dropping packet type={}", packet_type);
            self.stats.tx_rejected = self.stats.tx_rejected.wrapping_add(1);
            return Err(LinkError::TxFull);
        }

        self.tx.write(&frame[..len]);
        self.stats.tx_packets = self.stats.tx_packets.wrapping_add(1);
        Ok(len)
    }

    /// Queue raw bytes for transmission, returning how many fit
    pub fn write_raw(&mut self, bytes: &[u8]) -> usize {
        self.tx.write(bytes)
    }

    /// Push queued TX bytes to the transport until it stops accepting
    ///
    /// Returns the number of bytes written.
    pub fn flush_tx<U: UartTx>(&mut self, uart: &mut U) -> Result<usize, U::Error> {
        let mut written = 0;
        while !self.tx.is_empty() {
            let (front, _) = self.tx.as_slices();
            let n = uart.write(front)?;
            if n == 0 {
                break;
            }
            self.tx.consume(n);
            written += n;
        }
        self.stats.tx_bytes = self.stats.tx_bytes.wrapping_add(written as u32);
        Ok(written)
    }

    /// One main-loop pass: read pending bytes, run the receiver, send
    pub fn poll<U: Uart>(&mut self, uart: &mut U) -> Result<(), U::Error> {
        let mut scratch = [0u8; RX_SCRATCH_SIZE];
        loop {
            let room = self.rx.free().min(RX_SCRATCH_SIZE);
            if room == 0 {
                break;
            }
            let n = uart.read(&mut scratch[..room])?;
            if n == 0 {
                break;
            }
            self.on_rx(&scratch[..n]);
            // Keep the ring from filling while the transport still has data
            self.process_rx();
        }
        self.process_rx();
        self.flush_tx(uart)?;
        Ok(())
    }

    /// Bytes waiting in the RX ring
    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    /// Bytes waiting in the TX ring
    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn receiver(&self) -> &Receiver<H, N> {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut Receiver<H, N> {
        &mut self.receiver
    }

    /// Shortcut to the receiver's packet handler
    pub fn handler_mut(&mut self) -> &mut H {
        self.receiver.handler_mut()
    }
}
