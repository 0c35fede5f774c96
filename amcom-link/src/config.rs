//! Link configuration
//!
//! Settings come from a small TOML file:
//!
//! ```toml
//! [uart]
//! baudrate = 115200
//!
//! [link]
//! rx_chunk = 64
//!
//! [heartbeat]
//! period_ms = 1000
//! packet_type = 0x01
//! ```
//!
//! Every key is optional; missing keys keep their defaults. Parsing needs
//! the `toml` feature (host tools, build scripts); the types themselves are
//! usable everywhere.

use amcom_hal::UartConfig;

/// Lowest accepted baud rate
pub const MIN_BAUDRATE: u32 = 1200;

/// Highest accepted baud rate
pub const MAX_BAUDRATE: u32 = 4_000_000;

/// Largest UART read performed per poll
pub const MAX_RX_CHUNK: usize = 256;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Input is not valid TOML or has wrongly typed values
    Syntax,
    /// Baud rate outside `MIN_BAUDRATE..=MAX_BAUDRATE`
    InvalidBaudrate,
    /// `rx_chunk` is zero or larger than `MAX_RX_CHUNK`
    InvalidRxChunk,
}

/// `[uart]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartSettings {
    pub baudrate: u32,
}

impl Default for UartSettings {
    fn default() -> Self {
        Self { baudrate: 115200 }
    }
}

/// `[link]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkSettings {
    /// Bytes read from the UART per poll
    pub rx_chunk: usize,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self { rx_chunk: 64 }
    }
}

/// `[heartbeat]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartbeatSettings {
    /// Heartbeat period; 0 disables the heartbeat
    pub period_ms: u32,
    /// Packet type used for heartbeat packets
    pub packet_type: u8,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            packet_type: 0x01,
        }
    }
}

/// Complete link configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    pub uart: UartSettings,
    pub link: LinkSettings,
    pub heartbeat: HeartbeatSettings,
}

impl LinkConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BAUDRATE..=MAX_BAUDRATE).contains(&self.uart.baudrate) {
            return Err(ConfigError::InvalidBaudrate);
        }
        if self.link.rx_chunk == 0 || self.link.rx_chunk > MAX_RX_CHUNK {
            return Err(ConfigError::InvalidRxChunk);
        }
        Ok(())
    }

    /// UART settings for the HAL
    pub fn uart_config(&self) -> UartConfig {
        UartConfig::with_baudrate(self.uart.baudrate)
    }

    pub fn heartbeat_enabled(&self) -> bool {
        self.heartbeat.period_ms > 0
    }

    /// Parse and validate a TOML document
    #[cfg(feature = "toml")]
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|_| ConfigError::Syntax)?;
        config.validate()?;
        Ok(config)
    }
}
