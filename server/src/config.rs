/*
 * Created on Fri Mar 19 2021
 *
 * This file is a part of Spinel
 * Spinel is a free and open-source in-memory key/value database that
 * speaks the RESP wire protocol, written by the Spinel developers with
 * the vision to provide a simple and reliable caching primitive without
 * compromising on performance.
 *
 * Copyright (c) 2021, The Spinel developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! This module provides tools to handle configuration files and settings

use crate::diskstore;
use clap::load_yaml;
use clap::App;
use clap::ArgMatches;
use serde::Deserialize;
use std::env::{self, VarError};
use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// The default host
const DEFAULT_IPV4: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);
/// The default port
pub const DEFAULT_PORT: u16 = 6379;
/// The default maximum number of simultaneous connections
pub const DEFAULT_MAXCON: usize = 50000;

/// The runtime configuration of the server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// The host to bind to
    pub host: IpAddr,
    /// The port to bind to
    pub port: u16,
    /// The maximum number of simultaneous client connections
    pub maxcon: usize,
    /// If `noart` is set to true, no terminal art is printed at start-up
    pub noart: bool,
    /// The file that `SAVE` and the shutdown flush write the snapshot to
    pub savefile: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: IpAddr::V4(DEFAULT_IPV4),
            port: DEFAULT_PORT,
            maxcon: DEFAULT_MAXCON,
            noart: false,
            savefile: diskstore::PERSIST_FILE.clone(),
        }
    }
}

impl ServerConfig {
    /// Returns `false` if `noart` is set to true
    pub const fn is_artful(&self) -> bool {
        !self.noart
    }
}

/// The `[server]` key of the configuration file
#[derive(Debug, PartialEq, Deserialize)]
struct ConfigKeyServer {
    host: IpAddr,
    port: u16,
    maxcon: Option<usize>,
    noart: Option<bool>,
}

/// The `[snapshot]` key of the configuration file
#[derive(Debug, PartialEq, Deserialize)]
struct ConfigKeySnapshot {
    savefile: String,
}

/// The configuration file layout
#[derive(Debug, PartialEq, Deserialize)]
struct ConfigFile {
    server: ConfigKeyServer,
    snapshot: Option<ConfigKeySnapshot>,
}

impl From<ConfigFile> for ServerConfig {
    fn from(cfg: ConfigFile) -> Self {
        let def = ServerConfig::default();
        ServerConfig {
            host: cfg.server.host,
            port: cfg.server.port,
            maxcon: cfg.server.maxcon.unwrap_or(def.maxcon),
            noart: cfg.server.noart.unwrap_or(false),
            savefile: cfg
                .snapshot
                .map(|snap| PathBuf::from(snap.savefile))
                .unwrap_or(def.savefile),
        }
    }
}

/// The type of configuration that was evaluated:
/// - `Def` is the default configuration (nothing was supplied)
/// - `Custom` came from a configuration file, CLI arguments or the environment
///
/// The second field is the snapshot file to restore before accepting
/// connections, if one was named on the command line
pub enum ConfigType {
    Def(ServerConfig, Option<PathBuf>),
    Custom(ServerConfig, Option<PathBuf>),
}

#[derive(Debug)]
pub enum ConfigError {
    OSError(std::io::Error),
    ConfigFileParseError(toml::de::Error),
    BadValue(&'static str),
    Conflict,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OSError(e) => write!(f, "OS error: {}", e),
            Self::ConfigFileParseError(e) => {
                write!(f, "Couldn't parse the configuration file: {}", e)
            }
            Self::BadValue(e) => write!(f, "{}", e),
            Self::Conflict => write!(
                f,
                "You have provided settings through more than one configuration source"
            ),
        }
    }
}

/// Evaluate the configuration sources (configuration file, CLI arguments and
/// environment variables) into a [`ConfigType`]. Supplying settings through
/// more than one source is a conflict and is refused
pub fn get_config_file_or_return_cfg() -> Result<ConfigType, ConfigError> {
    let cfg_layout = load_yaml!("cli.yml");
    let matches = App::from_yaml(cfg_layout).get_matches();
    let restore_file = matches.value_of("restore").map(PathBuf::from);
    let cfg_from_file = match matches.value_of("config") {
        Some(filename) => {
            let file = fs::read(filename).map_err(ConfigError::OSError)?;
            let cfg_file: ConfigFile =
                toml::from_slice(&file).map_err(ConfigError::ConfigFileParseError)?;
            Some(ServerConfig::from(cfg_file))
        }
        None => None,
    };
    let cfg_from_cli = parse_cli_args(&matches)?;
    let cfg_from_env = parse_env_config()?;
    let cfg_degree =
        cfg_from_file.is_some() as u8 + cfg_from_cli.is_some() as u8 + cfg_from_env.is_some() as u8;
    if cfg_degree > 1 {
        return Err(ConfigError::Conflict);
    }
    match cfg_from_file.or(cfg_from_cli).or(cfg_from_env) {
        Some(cfg) => Ok(ConfigType::Custom(cfg, restore_file)),
        None => Ok(ConfigType::Def(ServerConfig::default(), restore_file)),
    }
}

/// Parse the command-line overrides, returning `None` if no setting was passed
fn parse_cli_args(matches: &ArgMatches) -> Result<Option<ServerConfig>, ConfigError> {
    let host = matches.value_of("host");
    let port = matches.value_of("port");
    let maxcon = matches.value_of("maxcon");
    let savefile = matches.value_of("savefile");
    let noart = matches.is_present("noart");
    if host.is_none() && port.is_none() && maxcon.is_none() && savefile.is_none() && !noart {
        return Ok(None);
    }
    let mut cfg = ServerConfig::default();
    if let Some(host) = host {
        cfg.host = host
            .parse()
            .map_err(|_| ConfigError::BadValue("Invalid value for `--host`"))?;
    }
    if let Some(port) = port {
        cfg.port = port
            .parse()
            .map_err(|_| ConfigError::BadValue("Invalid value for `--port`"))?;
    }
    if let Some(maxcon) = maxcon {
        cfg.maxcon = maxcon
            .parse()
            .map_err(|_| ConfigError::BadValue("Invalid value for `--maxcon`"))?;
    }
    if let Some(savefile) = savefile {
        cfg.savefile = PathBuf::from(savefile);
    }
    cfg.noart = noart;
    Ok(Some(cfg))
}

/// Parse the `SPINEL_*` environment variables, returning `None` if no
/// variable was set
fn parse_env_config() -> Result<Option<ServerConfig>, ConfigError> {
    let host = env::var("SPINEL_HOST");
    let port = env::var("SPINEL_PORT");
    let maxcon = env::var("SPINEL_MAXCON");
    if let (Err(VarError::NotPresent), Err(VarError::NotPresent), Err(VarError::NotPresent)) =
        (&host, &port, &maxcon)
    {
        return Ok(None);
    }
    let mut cfg = ServerConfig::default();
    if let Ok(host) = host {
        cfg.host = host
            .parse()
            .map_err(|_| ConfigError::BadValue("Invalid value for `SPINEL_HOST`"))?;
    }
    if let Ok(port) = port {
        cfg.port = port
            .parse()
            .map_err(|_| ConfigError::BadValue("Invalid value for `SPINEL_PORT`"))?;
    }
    if let Ok(maxcon) = maxcon {
        cfg.maxcon = maxcon
            .parse()
            .map_err(|_| ConfigError::BadValue("Invalid value for `SPINEL_MAXCON`"))?;
    }
    Ok(Some(cfg))
}
