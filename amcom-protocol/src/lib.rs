//! AMCOM Packet Protocol
//!
//! This crate implements the framing used on the AMCOM serial link. An
//! application payload is wrapped in a self-delimiting, checksummed packet
//! for transmission over an unreliable byte stream, and packets are
//! rebuilt from an arbitrarily fragmented incoming stream.
//!
//! # Packet Format
//!
//! ```text
//! ┌─────┬──────┬────────┬────────┬────────┬─────────────┐
//! │ SOP │ TYPE │ LENGTH │ CRC LO │ CRC HI │ PAYLOAD     │
//! │ 1B  │ 1B   │ 1B     │ 1B     │ 1B     │ 0–200B      │
//! └─────┴──────┴────────┴────────┴────────┴─────────────┘
//! ```
//!
//! The CRC covers TYPE, LENGTH and PAYLOAD (in that order) and is sent
//! little-endian. The SOP marker is not covered.
//!
//! The [`Receiver`] never reports decode errors. Damaged frames are dropped
//! and the receiver resynchronizes on the next SOP byte; a handler is only
//! called for complete frames whose checksum verifies.

#![no_std]
#![deny(unsafe_code)]

pub mod crc;
pub mod packet;
pub mod receiver;

pub use crc::{crc_of, update_crc, Crc, INITIAL_CRC};
pub use packet::{
    serialize, serialize_bounded, Packet, PacketHeader, SerializeError, HEADER_SIZE,
    MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE, SOP,
};
pub use receiver::{PacketHandler, Receiver, ReceiverStats};
