//! AMCOM Hardware Abstraction Layer
//!
//! Traits for the byte source and sink underneath an AMCOM link. Chip
//! support code implements these for its serial peripheral; the link and
//! protocol crates never touch hardware directly.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  amcom-link (ring buffers, receiver)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  amcom-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!         chip UART driver / test double
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{DataBits, ErrorType, Parity, StopBits, Uart, UartConfig, UartRx, UartTx};
