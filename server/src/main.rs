/*
 * Created on Sat Mar 13 2021
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

//! # Spinel
//!
//! The `spineld` crate (or the `server` folder) is Spinel's database server and
//! is the most important part of the project. There are several modules within
//! this crate; see the modules for their respective documentation.

use env_logger::Builder;
use libspinel::util::terminal;
use libspinel::URL;
use libspinel::VERSION;
use std::env;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time;
use tokio::signal;
mod config;
mod coredb;
mod dbnet;
mod diskstore;
mod kvengine;
mod protocol;
mod queryengine;
mod resp;
mod util;
use crate::config::ServerConfig;
use dbnet::run;
#[cfg(test)]
mod tests;

#[cfg(all(not(target_env = "msvc"), not(miri)))]
use jemallocator::Jemalloc;

#[cfg(all(not(target_env = "msvc"), not(miri)))]
#[global_allocator]
/// Jemallocator - this is the default memory allocator for platforms other than msvc
static GLOBAL: Jemalloc = Jemalloc;

/// The terminal art for `!noart` configurations
static TEXT: &str = "\n███████ ██████  ██ ███    ██ ███████ ██      \n██      ██   ██ ██ ████   ██ ██      ██      \n███████ ██████  ██ ██ ██  ██ █████   ██      \n     ██ ██      ██ ██  ██ ██ ██      ██      \n███████ ██      ██ ██   ████ ███████ ███████ \n                                             ";

fn main() {
    Builder::new()
        .parse_filters(&env::var("SPINEL_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    let (cfg, restore_filepath) = check_args_and_get_cfg();
    // Start the server which asynchronously waits for a CTRL+C signal
    // which will safely shut down the server
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("server")
        .enable_all()
        .build()
        .unwrap();
    let db = runtime.block_on(run(cfg, signal::ctrl_c(), restore_filepath));
    // Make sure all background workers terminate
    drop(runtime);
    let db = match db {
        Ok(db) => db,
        Err(e) => {
            log::error!("{}", e);
            process::exit(0x100);
        }
    };
    log::info!("Stopped accepting incoming connections");
    loop {
        // Keep looping until we successfully write the in-memory table to disk
        match db.flush_db() {
            Ok(_) => {
                log::info!("Successfully saved data to disk");
                break;
            }
            Err(e) => {
                log::error!(
                    "Failed to write data with error '{}'. Attempting to retry in 10s",
                    e
                );
            }
        }
        thread::sleep(time::Duration::from_secs(10));
    }
    terminal::write_info("Goodbye :)\n").unwrap();
}

/// This function checks the command line arguments and either returns a config object
/// or prints an error to `stderr` and terminates the server
fn check_args_and_get_cfg() -> (ServerConfig, Option<PathBuf>) {
    match config::get_config_file_or_return_cfg() {
        Ok(config::ConfigType::Custom(cfg, file)) => {
            if cfg.is_artful() {
                println!("Spinel v{} | {}\n{}", VERSION, URL, TEXT);
            } else {
                println!("Spinel v{} | {}", VERSION, URL);
            }
            log::info!("Using settings from supplied configuration");
            (cfg, file)
        }
        Ok(config::ConfigType::Def(cfg, file)) => {
            println!("Spinel v{} | {}\n{}", VERSION, URL, TEXT);
            log::warn!("No configuration file supplied. Using default settings");
            (cfg, file)
        }
        Err(e) => {
            log::error!("{}", e);
            process::exit(0x100);
        }
    }
}
