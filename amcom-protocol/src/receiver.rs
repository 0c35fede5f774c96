//! Packet receiver
//!
//! Byte-at-a-time state machine that rebuilds packets from a fragmented
//! input stream. Valid packets are handed to a [`PacketHandler`]; damaged
//! frames are dropped and the receiver goes back to hunting for SOP.
//!
//! ```text
//! Empty ─SOP→ GotSop ─type→ GotType ─len→ GotLength ─crc lo→ GotCrcLo
//!   ▲                          │ len > max                       │
//!   └──────────────────────────┘                                 │ crc hi
//!   ▲                                                            ▼
//!   └── verify + dispatch ◄─── GettingPayload ◄──── (len > 0) ───┤
//!   └── verify + dispatch ◄──────────────────────── (len == 0) ──┘
//! ```

use crate::crc::Crc;
use crate::packet::{Packet, PacketHeader, MAX_PAYLOAD_SIZE, SOP};

/// Sink for verified packets
///
/// Any `FnMut(&Packet<N>)` closure is a handler. State the handler needs
/// (the "user context") lives in the handler value itself and can be
/// reached through [`Receiver::handler_mut`].
///
/// The packet is only borrowed for the duration of the call; the receiver
/// reuses its payload storage for the next frame.
pub trait PacketHandler<const N: usize = MAX_PAYLOAD_SIZE> {
    /// Called once for every complete packet with a matching checksum
    fn on_packet(&mut self, packet: &Packet<N>);
}

impl<F, const N: usize> PacketHandler<N> for F
where
    F: FnMut(&Packet<N>),
{
    fn on_packet(&mut self, packet: &Packet<N>) {
        self(packet)
    }
}

/// Counters describing what the receiver has done with its input
///
/// These never influence dispatch: a handler is called if and only if a
/// complete frame with a matching checksum was assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiverStats {
    /// Packets handed to the handler
    pub packets_accepted: u32,
    /// Frames dropped because LENGTH exceeded the payload limit
    pub length_rejected: u32,
    /// Frames dropped because the checksum did not match
    pub checksum_rejected: u32,
    /// Bytes skipped while waiting for SOP
    pub bytes_discarded: u32,
}

/// Parser position within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for SOP
    Empty,
    /// Got SOP, waiting for TYPE
    GotSop,
    /// Got TYPE, waiting for LENGTH
    GotType { packet_type: u8 },
    /// Got LENGTH, waiting for CRC low byte
    GotLength { packet_type: u8, length: u8 },
    /// Got CRC low byte, waiting for CRC high byte
    GotCrcLo {
        packet_type: u8,
        length: u8,
        crc_lo: u8,
    },
    /// Reading payload bytes
    GettingPayload { header: PacketHeader },
}

/// Stream receiver for one byte source
///
/// Not internally synchronized: feed it from one context at a time.
#[derive(Debug, Clone)]
pub struct Receiver<H, const N: usize = MAX_PAYLOAD_SIZE> {
    state: State,
    crc: Crc,
    packet: Packet<N>,
    handler: H,
    stats: ReceiverStats,
}

impl<H: PacketHandler> Receiver<H> {
    /// Create a receiver using the default payload limit
    pub const fn new(handler: H) -> Self {
        Self::bounded(handler)
    }
}

impl<H: PacketHandler<N>, const N: usize> Receiver<H, N> {
    /// Create a receiver that accepts payloads of at most `N` bytes
    pub const fn bounded(handler: H) -> Self {
        Self {
            state: State::Empty,
            crc: Crc::new(),
            packet: Packet::cleared(),
            handler,
            stats: ReceiverStats {
                packets_accepted: 0,
                length_rejected: 0,
                checksum_rejected: 0,
                bytes_discarded: 0,
            },
        }
    }

    /// Feed a chunk of the input stream
    ///
    /// Chunks may split frames anywhere and may hold several frames; the
    /// handler is called synchronously for each valid one, in order.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed_byte(byte);
        }
    }

    /// Feed a single byte
    pub fn feed_byte(&mut self, byte: u8) {
        let state = self.state;
        self.state = match state {
            State::Empty => {
                if byte == SOP {
                    self.crc = Crc::new();
                    self.packet.payload.clear();
                    State::GotSop
                } else {
                    // Silently skip noise while hunting for sync
                    self.stats.bytes_discarded = self.stats.bytes_discarded.wrapping_add(1);
                    State::Empty
                }
            }
            State::GotSop => {
                self.crc.update(byte);
                State::GotType { packet_type: byte }
            }
            State::GotType { packet_type } => {
                self.crc.update(byte);
                if byte as usize > N {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Dropping frame: length {} exceeds {}", byte, N);
                    self.stats.length_rejected = self.stats.length_rejected.wrapping_add(1);
                    State::Empty
                } else {
                    State::GotLength {
                        packet_type,
                        length: byte,
                    }
                }
            }
            State::GotLength {
                packet_type,
                length,
            } => State::GotCrcLo {
                packet_type,
                length,
                crc_lo: byte,
            },
            State::GotCrcLo {
                packet_type,
                length,
                crc_lo,
            } => {
                let header = PacketHeader {
                    sop: SOP,
                    packet_type,
                    length,
                    crc: u16::from_le_bytes([crc_lo, byte]),
                };
                if length == 0 {
                    self.complete(header);
                    State::Empty
                } else {
                    State::GettingPayload { header }
                }
            }
            State::GettingPayload { header } => {
                self.crc.update(byte);
                // Cannot overflow: LENGTH was checked against N
                let _ = self.packet.payload.push(byte);
                if self.packet.payload.len() >= header.length as usize {
                    self.complete(header);
                    State::Empty
                } else {
                    State::GettingPayload { header }
                }
            }
        };
    }

    /// Verify the assembled frame, dispatch it if valid, and discard it
    fn complete(&mut self, header: PacketHeader) {
        if self.crc.value() == header.crc {
            #[cfg(feature = "defmt")]
            defmt::trace!(
                "Packet type={} len={}",
                header.packet_type,
                header.length
            );
            self.packet.header = header;
            self.stats.packets_accepted = self.stats.packets_accepted.wrapping_add(1);
            self.handler.on_packet(&self.packet);
        } else {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "Dropping frame: crc {=u16:#x} != {=u16:#x}",
                self.crc.value(),
                header.crc
            );
            self.stats.checksum_rejected = self.stats.checksum_rejected.wrapping_add(1);
        }
        self.packet = Packet::cleared();
    }
}

impl<H, const N: usize> Receiver<H, N> {
    /// Abandon any partial frame and wait for the next SOP
    pub fn reset(&mut self) {
        self.state = State::Empty;
        self.crc = Crc::new();
        self.packet.header = PacketHeader::cleared();
        self.packet.payload.clear();
    }

    /// True when no frame is in progress
    pub fn is_idle(&self) -> bool {
        self.state == State::Empty
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    pub fn clear_stats(&mut self) {
        self.stats = ReceiverStats::default();
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the receiver, returning its handler
    pub fn into_handler(self) -> H {
        self.handler
    }
}
