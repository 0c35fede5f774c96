//! AMCOM link plumbing
//!
//! Everything between a serial peripheral and the packet protocol:
//!
//! - [`RingBuffer`] - byte FIFOs between the UART interrupt and the main loop
//! - [`Link`] - feeds received bytes to a [`Receiver`](amcom_protocol::Receiver)
//!   and queues serialized packets for transmission
//! - [`EventManager`] - timed callbacks run from the main loop (heartbeats,
//!   timeouts)
//! - [`LinkConfig`] - link settings, loadable from TOML

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod event;
pub mod link;
pub mod ring_buffer;

pub use config::{ConfigError, LinkConfig};
pub use event::{EventError, EventHandler, EventId, EventManager};
pub use link::{Link, LinkError, LinkStats};
pub use ring_buffer::RingBuffer;
