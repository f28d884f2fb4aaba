//! Build script for meshbridge-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates bridge.toml and bakes it into the firmware

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted in bridge.toml and the largest value each field type holds
const KEYS: &[(&str, i64)] = &[
    ("period_ms", u32::MAX as i64),
    ("dequeue_timeout_ms", u32::MAX as i64),
    ("tx_chunk_len", u16::MAX as i64),
    ("sensor_interval_ms", u32::MAX as i64),
    ("node_address", u16::MAX as i64),
];

fn main() {
    setup_linker();
    embed_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate bridge.toml and generate `bridge_config.rs` in OUT_DIR
///
/// Only syntax, key names and integer ranges are checked here. Cross-field
/// rules are enforced by `BridgeConfig::validate` in a const assertion.
fn embed_config() {
    println!("cargo:rerun-if-changed=bridge.toml");

    let config_path = Path::new("bridge.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bridge.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a bridge.toml configuration file.         ║\n\
            ║  Please create one in the meshbridge-firmware directory.         ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bridge.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let table: toml::Table = match toml::from_str(&content) {
        Ok(table) => table,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in bridge.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let fields = match validate_fields(&table) {
        Ok(fields) => fields,
        Err(errors) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid settings in bridge.toml                          ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                errors
                    .iter()
                    .map(|e| format!("║  • {:<62} ║", e))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }
    };

    let mut generated = String::from(
        "/// Configuration baked in from bridge.toml\n\
         pub const EMBEDDED_CONFIG: BridgeConfig = BridgeConfig {\n",
    );
    for (key, value) in &fields {
        writeln!(generated, "    {}: {},", key, value).unwrap();
    }
    generated.push_str("    ..BridgeConfig::DEFAULT\n};\n");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("bridge_config.rs"), generated).unwrap();

    println!("cargo:warning=bridge.toml validated successfully");
}

/// Check every key is known and every value fits its field
fn validate_fields(table: &toml::Table) -> Result<Vec<(&str, i64)>, Vec<String>> {
    let mut errors = Vec::new();
    let mut fields = Vec::new();

    for (key, value) in table {
        let Some(&(name, max)) = KEYS.iter().find(|(name, _)| *name == key.as_str()) else {
            errors.push(format!("unknown key '{}'", key));
            continue;
        };

        match value {
            toml::Value::Integer(n) if (0..=max).contains(n) => fields.push((name, *n)),
            toml::Value::Integer(_) => errors.push(format!("'{}' must be 0-{}", name, max)),
            _ => errors.push(format!("'{}' must be an integer", name)),
        }
    }

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(errors)
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
