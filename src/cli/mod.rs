//! Console client for the recommendation server.
//!
//! These commands talk to a running `tunerec serve` over the line protocol,
//! the same way any other client would.

mod connection;
mod recommend;
mod search;
mod serve;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

pub use connection::{Reply, ServerConnection};
pub use recommend::recommend;
pub use search::search;
pub use serve::{ServeOverrides, serve};

use crate::types::{Track, TrackTableRow};

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn print_tracks(tracks: &[Track]) {
    let rows: Vec<TrackTableRow> = tracks
        .iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow::from_track(i + 1, t))
        .collect();
    println!("{}", Table::new(rows));
}
