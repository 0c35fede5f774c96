//! Application task
//!
//! Answers PING packets with a PONG carrying the same payload and logs
//! everything else.

use defmt::*;

use amcom_protocol::Packet;

use crate::channels::{INBOX, OUTBOX};

/// Echo request
pub const MSG_PING: u8 = 0x02;

/// Echo response
pub const MSG_PONG: u8 = 0x03;

/// Application task - consumes verified packets
#[embassy_executor::task]
pub async fn app_task() {
    info!("App task started");

    loop {
        let packet = INBOX.receive().await;
        match packet.packet_type() {
            MSG_PING => match Packet::new(MSG_PONG, packet.payload()) {
                Ok(pong) => {
                    OUTBOX.send(pong).await;
                    trace!("PONG queued");
                }
                Err(e) => warn!("Failed to build PONG: {:?}", e),
            },
            other => {
                debug!("Packet type={} len={}", other, packet.len());
            }
        }
    }
}
