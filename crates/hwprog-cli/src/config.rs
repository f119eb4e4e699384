use std::{
    fs, io,
    path::{Path, PathBuf},
};

use hwprog_util::{
    data_dir, env_value, state_file_path, write_json_atomic, DEFAULT_BASE_URL, FLASH_ENDPOINT,
    FPGA_ENDPOINT, LIST_HW_ENDPOINT,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

const CLI_CONFIG_FILE: &str = "cli-config.json";
const SERVERS_FILE: &str = "programming_servers.json";

const BASE_URL_ENV: &str = "HWPROG_BASE_URL";
const SERVERS_FILE_ENV: &str = "HWPROG_SERVERS_FILE";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    pub(crate) base_url: String,
    pub(crate) servers_file: String,
    pub(crate) fpga_endpoint: String,
    pub(crate) flash_endpoint: String,
    pub(crate) list_hw_endpoint: String,
    pub(crate) last_hw_server: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: env_value(BASE_URL_ENV, DEFAULT_BASE_URL),
            servers_file: std::env::var(SERVERS_FILE_ENV).unwrap_or_else(|_| {
                data_dir().join(SERVERS_FILE).to_string_lossy().into_owned()
            }),
            fpga_endpoint: FPGA_ENDPOINT.into(),
            flash_endpoint: FLASH_ENDPOINT.into(),
            list_hw_endpoint: LIST_HW_ENDPOINT.into(),
            last_hw_server: String::new(),
        }
    }
}

impl CliConfig {
    pub(crate) fn load() -> Self {
        Self::load_from(&cli_config_path(), |key| std::env::var(key).is_ok())
    }

    /// Reads the saved config at `path`. Values whose environment variable is
    /// set keep the environment's value.
    pub(crate) fn load_from(path: &Path, env_set: impl Fn(&str) -> bool) -> Self {
        let mut cfg = CliConfig::default();
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<CliConfig>(&data) {
                Ok(file_cfg) => cfg.merge_file(file_cfg, env_set),
                Err(err) => warn!("Failed to parse {}: {err}", path.display()),
            },
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}", path.display());
                }
            }
        }
        cfg
    }

    fn merge_file(&mut self, file_cfg: CliConfig, env_set: impl Fn(&str) -> bool) {
        if !env_set(BASE_URL_ENV) && !file_cfg.base_url.is_empty() {
            self.base_url = file_cfg.base_url;
        }
        if !env_set(SERVERS_FILE_ENV) && !file_cfg.servers_file.is_empty() {
            self.servers_file = file_cfg.servers_file;
        }
        if !file_cfg.fpga_endpoint.is_empty() {
            self.fpga_endpoint = file_cfg.fpga_endpoint;
        }
        if !file_cfg.flash_endpoint.is_empty() {
            self.flash_endpoint = file_cfg.flash_endpoint;
        }
        if !file_cfg.list_hw_endpoint.is_empty() {
            self.list_hw_endpoint = file_cfg.list_hw_endpoint;
        }
        self.last_hw_server = file_cfg.last_hw_server;
    }

    pub(crate) fn save(&self) -> io::Result<()> {
        self.save_to(&cli_config_path())
    }

    pub(crate) fn save_to(&self, path: &Path) -> io::Result<()> {
        write_json_atomic(path, self)
    }
}

fn cli_config_path() -> PathBuf {
    state_file_path(CLI_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> bool {
        false
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CliConfig::load_from(&dir.path().join("cli-config.json"), no_env);
        assert_eq!(cfg.fpga_endpoint, "/program_fpga");
        assert_eq!(cfg.flash_endpoint, "/program_flash");
        assert_eq!(cfg.list_hw_endpoint, "/list_hw");
        assert!(cfg.last_hw_server.is_empty());
    }

    #[test]
    fn saved_values_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cli-config.json");
        let cfg = CliConfig {
            base_url: "http://lab-host:5000".into(),
            last_hw_server: "lab-1:3121".into(),
            list_hw_endpoint: "/hw/list".into(),
            ..CliConfig::default()
        };
        cfg.save_to(&path).unwrap();

        let loaded = CliConfig::load_from(&path, no_env);
        assert_eq!(loaded.base_url, "http://lab-host:5000");
        assert_eq!(loaded.last_hw_server, "lab-1:3121");
        assert_eq!(loaded.list_hw_endpoint, "/hw/list");
    }

    #[test]
    fn environment_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli-config.json");
        fs::write(
            &path,
            r#"{"base_url": "http://from-file:5000", "last_hw_server": "lab-2:3121"}"#,
        )
        .unwrap();

        let cfg = CliConfig::load_from(&path, |key| key == BASE_URL_ENV);
        assert_ne!(cfg.base_url, "http://from-file:5000");
        assert_eq!(cfg.last_hw_server, "lab-2:3121");
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli-config.json");
        fs::write(&path, "{ not json").unwrap();
        let cfg = CliConfig::load_from(&path, no_env);
        assert_eq!(cfg.fpga_endpoint, "/program_fpga");
    }
}
