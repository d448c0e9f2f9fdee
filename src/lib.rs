//! Corkboard is an engine for internal discussion boards: registered users
//! open threads, comment, tag, like, attach files, and report content, and
//! moderators triage the reports.
//!
//! This crate is the domain and persistence core only. HTTP routing, HTML
//! rendering, and session handling live in whatever serves the board; they
//! hold a [`Board`] and call into it.

use std::path::Path;

use chrono::Utc;

pub mod board;
pub mod config;
pub mod error;
pub mod files;
pub mod models;
pub mod schema;

pub use crate::board::Board;
pub use crate::config::Config;
pub use crate::error::{Error, Result};

/// Set up logging, optionally teeing into a log file.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    use fern::colors::ColoredLevelConfig;

    let colors = ColoredLevelConfig::new();

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                Utc::now().format("%F %T"),
                colors.color(record.level()),
                message,
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;

    Ok(())
}
