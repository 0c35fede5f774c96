//! Link configuration
//!
//! Generated by build.rs from link.toml, which is validated on the host
//! before the firmware is compiled.

use amcom_link::config::{HeartbeatSettings, LinkConfig, LinkSettings, UartSettings};

include!(concat!(env!("OUT_DIR"), "/link_config.rs"));
