use std::{
    fs, io,
    path::{Path, PathBuf},
};

use hwprog_telemetry as telemetry;
use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

pub const FPGA_ENDPOINT: &str = "/program_fpga";
pub const FLASH_ENDPOINT: &str = "/program_flash";
pub const LIST_HW_ENDPOINT: &str = "/list_hw";

pub fn env_value(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Joins a server base url and an endpoint path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{path}")
}

/// `~/.local/share/hwprog`, or `/tmp/hwprog` without a home directory.
pub fn data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".local/share/hwprog"))
        .unwrap_or_else(|| PathBuf::from("/tmp/hwprog"))
}

pub fn state_file_path(file_name: &str) -> PathBuf {
    data_dir().join("state").join(file_name)
}

/// Expands a leading `~` to `$HOME`; other paths pass through.
pub fn expand_user(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => PathBuf::from(path),
    }
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Installs the fmt subscriber on stderr; stdout is reserved for streamed output.
/// `RUST_LOG` picks the filter, `warn` otherwise.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| err as Box<dyn std::error::Error>)?;
    Ok(())
}

pub fn init_cli_telemetry(app_name: &'static str, app_version: &'static str, command: &str) {
    telemetry::install_from_env(app_name, app_version);
    telemetry::event("cli.start", &[("command", command)]);
}
