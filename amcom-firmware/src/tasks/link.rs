//! Link task
//!
//! Owns the AMCOM link: moves UART bytes through the packet receiver,
//! queues outgoing packets and runs link-level timed events.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{Duration, Instant, Ticker};
use embedded_io_async::{Read, Write};
use heapless::Vec;

use amcom_hal::{ErrorType, UartTx};
use amcom_link::config::MAX_RX_CHUNK;
use amcom_link::{EventId, EventManager, Link};
use amcom_protocol::{Packet, PacketHandler, Receiver, MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE};

use crate::channels::{INBOX, OUTBOX};
use crate::config::LINK_CONFIG;

/// Ring sizes: room for two full packets each way
const RX_RING_SIZE: usize = 2 * MAX_PACKET_SIZE;
const TX_RING_SIZE: usize = 2 * MAX_PACKET_SIZE;

/// How often queued work is serviced when the line is quiet
const SERVICE_INTERVAL_MS: u64 = 10;

/// Maximum number of link events
const MAX_EVENTS: usize = 4;

/// Hands verified packets to the application task
struct Forwarder;

impl PacketHandler for Forwarder {
    fn on_packet(&mut self, packet: &Packet) {
        if INBOX.try_send(packet.clone()).is_err() {
            warn!("Inbox full, dropping packet type={}", packet.packet_type());
        }
    }
}

type FirmwareLink = Link<Forwarder, RX_RING_SIZE, TX_RING_SIZE, MAX_PAYLOAD_SIZE>;

/// Staging buffer between the TX ring and the async UART writer
struct TxStage {
    buf: Vec<u8, MAX_PACKET_SIZE>,
}

impl ErrorType for TxStage {
    type Error = core::convert::Infallible;
}

impl UartTx for TxStage {
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        let n = data.len().min(self.buf.capacity() - self.buf.len());
        // Cannot fail: n is bounded by the remaining capacity
        let _ = self.buf.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// State shared with event handlers
struct LinkContext {
    link: FirmwareLink,
    beats: u8,
}

/// Periodic heartbeat carrying a wrapping counter
fn heartbeat(ctx: &mut LinkContext, _id: EventId, time: u64) -> Option<u64> {
    ctx.beats = ctx.beats.wrapping_add(1);
    match ctx.link.send(LINK_CONFIG.heartbeat.packet_type, &[ctx.beats]) {
        Ok(_) => trace!("Heartbeat {} queued", ctx.beats),
        Err(e) => warn!("Heartbeat dropped: {:?}", e),
    }
    Some(time + LINK_CONFIG.heartbeat.period_ms as u64)
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// Link task - owns the UART and the packet receiver
#[embassy_executor::task]
pub async fn link_task(mut tx: BufferedUartTx, mut rx: BufferedUartRx) {
    info!("Link task started");

    let mut ctx = LinkContext {
        link: Link::new(Receiver::new(Forwarder)),
        beats: 0,
    };

    let mut events = EventManager::<LinkContext, MAX_EVENTS>::new();
    if LINK_CONFIG.heartbeat_enabled() {
        match events.register(heartbeat) {
            Ok(id) => {
                let _ = events.schedule(id, now_ms());
            }
            Err(e) => warn!("Failed to register heartbeat: {:?}", e),
        }
    }

    let mut ticker = Ticker::every(Duration::from_millis(SERVICE_INTERVAL_MS));
    let mut buf = [0u8; MAX_RX_CHUNK];
    let chunk = LINK_CONFIG.link.rx_chunk.min(MAX_RX_CHUNK);
    let mut stage = TxStage { buf: Vec::new() };

    loop {
        // Wake on incoming bytes or on the service tick
        match select(rx.read(&mut buf[..chunk]), ticker.next()).await {
            Either::First(Ok(n)) => {
                trace!("RX: {} bytes", n);
                ctx.link.on_rx(&buf[..n]);
            }
            Either::First(Err(e)) => {
                warn!("UART read error: {:?}", e);
            }
            Either::Second(()) => {}
        }

        ctx.link.process_rx();

        while let Ok(packet) = OUTBOX.try_receive() {
            if let Err(e) = ctx.link.send(packet.packet_type(), packet.payload()) {
                warn!("Failed to queue packet type={}: {:?}", packet.packet_type(), e);
            }
        }

        events.process(now_ms(), &mut ctx);

        // Drain the TX ring through the staging buffer
        loop {
            stage.buf.clear();
            let _ = ctx.link.flush_tx(&mut stage);
            if stage.buf.is_empty() {
                break;
            }
            if let Err(e) = tx.write_all(&stage.buf).await {
                warn!("UART write error: {:?}", e);
                break;
            }
        }
    }
}
