//! Build script for amcom-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates link.toml and compiles it into the firmware

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use amcom_link::{ConfigError, LinkConfig};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    setup_linker(&out_dir);
    let config = validate_config();
    write_config(&out_dir, &config);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse and validate link.toml at compile time
fn validate_config() -> LinkConfig {
    println!("cargo:rerun-if-changed=link.toml");

    let config_path = Path::new("link.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail(&["Failed to read link.toml", &e.to_string()]),
    };

    match LinkConfig::from_toml(&content) {
        Ok(config) => {
            println!("cargo:warning=link.toml validated successfully");
            config
        }
        Err(ConfigError::Syntax) => {
            // Reparse as a plain table to get a useful message
            let detail = match content.parse::<toml::Table>() {
                Err(e) => e.to_string(),
                Ok(_) => "unknown key or wrongly typed value".to_string(),
            };
            fail(&["Invalid link.toml", &detail])
        }
        Err(ConfigError::InvalidBaudrate) => fail(&[
            "Invalid [uart] baudrate in link.toml",
            "baudrate must be 1200-4000000",
        ]),
        Err(ConfigError::InvalidRxChunk) => fail(&[
            "Invalid [link] rx_chunk in link.toml",
            "rx_chunk must be 1-256",
        ]),
    }
}

/// Emit the validated config as a Rust constant
fn write_config(out_dir: &Path, config: &LinkConfig) {
    let source = format!(
        "pub const LINK_CONFIG: LinkConfig = LinkConfig {{\n    \
             uart: UartSettings {{ baudrate: {} }},\n    \
             link: LinkSettings {{ rx_chunk: {} }},\n    \
             heartbeat: HeartbeatSettings {{ period_ms: {}, packet_type: {:#04x} }},\n\
         }};\n",
        config.uart.baudrate,
        config.link.rx_chunk,
        config.heartbeat.period_ms,
        config.heartbeat.packet_type,
    );
    fs::write(out_dir.join("link_config.rs"), source).unwrap();
}

/// Abort the build with a boxed error message
fn fail(lines: &[&str]) -> ! {
    let body = lines
        .iter()
        .flat_map(|l| l.lines())
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        body
    );
}
