//! Version command

use crossterm::style::Stylize;
use four_schema::{Platform, build_host_tag};

/// Print the `four` version and what host it runs on.
pub fn version() {
    println!(
        "{} {}",
        "four".white().bold(),
        env!("CARGO_PKG_VERSION").dark_grey()
    );
    println!("  host      {} ({})", Platform::current(), build_host_tag());
}
