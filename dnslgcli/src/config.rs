use libdnslg::ProbeConfig;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration directory on this system")]
    NoConfigDir,
    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeSection,
    #[serde(default)]
    pub bootstrap: BootstrapSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProbeSection {
    pub connect_timeout_secs: Option<u64>,
    pub read_write_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BootstrapSection {
    pub name: Option<String>,
    pub resolver: Option<SocketAddr>,
}

impl Config {
    /// Timeouts from the file, overridden by whatever the command line gave.
    pub fn probe_config(&self, connect_secs: Option<u64>, read_write_secs: Option<u64>) -> ProbeConfig {
        let defaults = ProbeConfig::default();
        let pick = |cli: Option<u64>, file: Option<u64>, default: Duration| {
            cli.or(file).map(Duration::from_secs).unwrap_or(default)
        };
        ProbeConfig {
            connect_timeout: pick(connect_secs, self.probe.connect_timeout_secs, defaults.connect_timeout),
            read_write_timeout: pick(
                read_write_secs,
                self.probe.read_write_timeout_secs,
                defaults.read_write_timeout,
            ),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("dnslg").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Missing file means defaults. A file that does not parse is reported and ignored.
pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    parse_config(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring invalid config file");
        Config::default()
    })
}

pub fn default_config_toml() -> String {
    r#"# DNS looking-glass tools configuration

[probe]
# Seconds allowed to open the connection to an instance
# connect_timeout_secs = 5
# Seconds allowed for sending the request and reading the reply
# read_write_timeout_secs = 5

[bootstrap]
# TXT record listing the public instances (dnslg-query)
# name = "existing-dns-lg.bortzmeyer.fr."
# Name server for that lookup; the first one from the system configuration otherwise
# resolver = "192.0.2.53:53"
"#
    .to_string()
}

pub fn write_default_config() -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    let write_error = |source| ConfigError::Write {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(&path, default_config_toml()).map_err(write_error)?;
    Ok(path)
}
