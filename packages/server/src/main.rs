#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the Berlin map API server.
//!
//! Reads configuration from `BERLIN_MAP_CONFIG` (or the embedded defaults)
//! plus environment overrides, then serves until interrupted.

use berlin_map_config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = Config::load(None).map_err(std::io::Error::other)?;
    berlin_map_server::run_server(config).await
}
