//! Two links talking over a simulated serial line, with heartbeats driven
//! by the event manager.

use std::collections::VecDeque;

use amcom_hal::{ErrorType, UartRx, UartTx};
use amcom_link::{EventId, EventManager, Link, LinkConfig};
use amcom_protocol::{Packet, PacketHandler, Receiver, MAX_PAYLOAD_SIZE};

/// One direction of a serial line
#[derive(Default)]
struct Wire {
    bytes: VecDeque<u8>,
    /// Flip bit 0 of the byte at this index (counted over all bytes sent)
    corrupt_at: Option<usize>,
    sent: usize,
}

/// UART end: transmits onto `tx`, receives from `rx`
struct Port<'a> {
    tx: &'a mut Wire,
    rx: &'a mut Wire,
}

impl ErrorType for Port<'_> {
    type Error = core::convert::Infallible;
}

impl UartTx for Port<'_> {
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        for &byte in data {
            let byte = if self.tx.corrupt_at == Some(self.tx.sent) {
                byte ^ 0x01
            } else {
                byte
            };
            self.tx.bytes.push_back(byte);
            self.tx.sent += 1;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl UartRx for Port<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.bytes.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

#[derive(Default)]
struct Inbox {
    packets: Vec<(u8, Vec<u8>)>,
}

impl PacketHandler for Inbox {
    fn on_packet(&mut self, packet: &Packet) {
        self.packets
            .push((packet.packet_type(), packet.payload().to_vec()));
    }
}

type Node = Link<Inbox, 256, 256, MAX_PAYLOAD_SIZE>;

/// Event context: the link plus heartbeat settings
struct Controller {
    link: Node,
    heartbeat_type: u8,
    period_ms: u64,
    beats: u8,
}

fn heartbeat(ctl: &mut Controller, _id: EventId, time: u64) -> Option<u64> {
    ctl.beats = ctl.beats.wrapping_add(1);
    let _ = ctl.link.send(ctl.heartbeat_type, &[ctl.beats]);
    Some(time + ctl.period_ms)
}

fn node() -> Node {
    Link::new(Receiver::new(Inbox::default()))
}

#[test]
fn heartbeats_cross_the_wire() {
    let config = LinkConfig::from_toml("[heartbeat]\nperiod_ms = 100\npacket_type = 0x42\n").unwrap();

    let mut a_to_b = Wire::default();
    let mut b_to_a = Wire::default();

    let mut ctl = Controller {
        link: node(),
        heartbeat_type: config.heartbeat.packet_type,
        period_ms: config.heartbeat.period_ms as u64,
        beats: 0,
    };
    let mut b = node();

    let mut events = EventManager::<Controller, 4>::new();
    let beat = events.register(heartbeat).unwrap();
    events.schedule(beat, 0).unwrap();

    for now in (0..=350).step_by(50) {
        events.process(now, &mut ctl);
        ctl.link
            .poll(&mut Port {
                tx: &mut a_to_b,
                rx: &mut b_to_a,
            })
            .unwrap();
        b.poll(&mut Port {
            tx: &mut b_to_a,
            rx: &mut a_to_b,
        })
        .unwrap();
    }

    let received = &b.handler_mut().packets;
    assert_eq!(
        received,
        &vec![
            (0x42, vec![1]),
            (0x42, vec![2]),
            (0x42, vec![3]),
            (0x42, vec![4]),
        ]
    );
    assert_eq!(events.scheduled_time(beat), Some(400));
}

#[test]
fn corrupted_packet_is_dropped_and_link_recovers() {
    let mut a_to_b = Wire {
        // Inside the first packet's payload
        corrupt_at: Some(6),
        ..Wire::default()
    };
    let mut b_to_a = Wire::default();

    let mut a = node();
    let mut b = node();

    a.send(0x10, b"first").unwrap();
    a.send(0x11, b"second").unwrap();
    a.poll(&mut Port {
        tx: &mut a_to_b,
        rx: &mut b_to_a,
    })
    .unwrap();

    // Deliver in awkward pieces
    let mut port = Port {
        tx: &mut b_to_a,
        rx: &mut a_to_b,
    };
    let mut piece = [0u8; 3];
    loop {
        let n = port.read(&mut piece).unwrap();
        if n == 0 {
            break;
        }
        b.on_rx(&piece[..n]);
        b.process_rx();
    }

    assert_eq!(b.handler_mut().packets, vec![(0x11, b"second".to_vec())]);
    assert_eq!(b.receiver().stats().checksum_rejected, 1);
    assert_eq!(b.receiver().stats().packets_accepted, 1);
}

#[test]
fn request_response_round_trip() {
    let mut a_to_b = Wire::default();
    let mut b_to_a = Wire::default();
    let mut a = node();
    let mut b = node();

    a.send(0x01, &[0xA1, 0x00, 0xFF]).unwrap();
    a.poll(&mut Port { tx: &mut a_to_b, rx: &mut b_to_a }).unwrap();
    b.poll(&mut Port { tx: &mut b_to_a, rx: &mut a_to_b }).unwrap();

    // Echo everything back with the type bumped
    let requests = std::mem::take(&mut b.handler_mut().packets);
    for (packet_type, payload) in requests {
        b.send(packet_type + 1, &payload).unwrap();
    }
    b.poll(&mut Port { tx: &mut b_to_a, rx: &mut a_to_b }).unwrap();
    a.poll(&mut Port { tx: &mut a_to_b, rx: &mut b_to_a }).unwrap();

    assert_eq!(a.handler_mut().packets, vec![(0x02, vec![0xA1, 0x00, 0xFF])]);
}
