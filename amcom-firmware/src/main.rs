//! AMCOM link firmware
//!
//! Runs an AMCOM packet link on UART0 of an RP2040 board: received
//! packets are verified and handed to the application task, replies and
//! heartbeats go out the same UART.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::config::LINK_CONFIG;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("AMCOM firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = LINK_CONFIG.uart.baudrate;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!(
        "UART0 at {} baud, heartbeat every {} ms",
        LINK_CONFIG.uart.baudrate, LINK_CONFIG.heartbeat.period_ms
    );

    spawner.spawn(tasks::link_task(tx, rx)).unwrap();
    spawner.spawn(tasks::app_task()).unwrap();

    info!("All tasks spawned");
}
