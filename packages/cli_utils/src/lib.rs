#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output helpers for the `berlin_map` tool.
//!
//! [`GeocodeProgress`] shows crime-location geocoding as it happens, and
//! [`init_logger`] routes `log` output through the same [`MultiProgress`]
//! so log lines do not tear through a redrawing bar.

use std::sync::Arc;
use std::time::Duration;

use berlin_map_crime::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

const WAITING_TEMPLATE: &str = "{prefix:>8.cyan.bold} {spinner} {msg}";
const COUNTING_TEMPLATE: &str =
    "{prefix:>8.cyan.bold} [{bar:30.cyan/blue}] {pos:>3}/{len} locations ({per_sec}, {eta} left) {msg:.dim}";

/// Progress display for the crime aggregator's geocoding loop.
///
/// Spins until the number of locations is known, then counts them off.
/// The message slot shows the location currently being looked up.
pub struct GeocodeProgress {
    bar: ProgressBar,
}

impl GeocodeProgress {
    /// Adds a geocoding display to `multi`.
    #[must_use]
    pub fn attach(multi: &MultiProgress) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(style(WAITING_TEMPLATE, ProgressStyle::default_spinner));
        bar.set_prefix("geocode");
        bar.set_message("reading crime dataset");
        bar.enable_steady_tick(Duration::from_millis(120));

        Arc::new(Self { bar })
    }
}

fn style(template: &str, fallback: fn() -> ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|e| {
        log::debug!("Invalid progress template: {e}");
        fallback()
    })
}

impl ProgressCallback for GeocodeProgress {
    fn set_total(&self, total: u64) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_style(
            style(COUNTING_TEMPLATE, ProgressStyle::default_bar).progress_chars("=> "),
        );
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.disable_steady_tick();
        self.bar.finish_with_message(msg);
    }
}

/// Installs a pretty logger behind `indicatif-log-bridge`.
///
/// `default_filter` applies when `RUST_LOG` is unset; directives in
/// `RUST_LOG` are parsed after it and take precedence. Bars for long
/// runs must be added to the returned [`MultiProgress`].
#[must_use]
pub fn init_logger(default_filter: &str) -> MultiProgress {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.parse_filters(default_filter);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let logger = builder.build();
    let level = logger.filter();

    let multi = MultiProgress::new();
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn templates_parse() {
        assert!(ProgressStyle::with_template(WAITING_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(COUNTING_TEMPLATE).is_ok());
    }

    #[test]
    fn counts_locations_once_total_is_known() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = multi.add(ProgressBar::new_spinner());
        let progress = GeocodeProgress { bar: bar.clone() };

        progress.set_total(3);
        progress.set_message("Mitte, Berlin".to_string());
        progress.inc(2);

        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.position(), 2);
        assert_eq!(bar.message(), "Mitte, Berlin");

        progress.finish("3 locations".to_string());
        assert!(bar.is_finished());
    }
}
