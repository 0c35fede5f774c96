//! Inter-task communication channels
//!
//! The link task owns the UART and the packet receiver; application
//! code only sees whole packets through these channels.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use amcom_protocol::Packet;

/// Channel capacity for received packets
const INBOX_SIZE: usize = 4;

/// Channel capacity for packets waiting to be sent
const OUTBOX_SIZE: usize = 4;

/// Verified packets from the peer
pub static INBOX: Channel<CriticalSectionRawMutex, Packet, INBOX_SIZE> = Channel::new();

/// Packets to queue on the link
pub static OUTBOX: Channel<CriticalSectionRawMutex, Packet, OUTBOX_SIZE> = Channel::new();
