//! # rental-cli — Loan Lifecycle Command-Line Interface
//!
//! Offline views of the loan state machine, for reviewing the transition
//! table and trying out individual requests without a running server.
//!
//! ## Subcommands
//!
//! - `matrix` — every (state, actor) row with allowed targets, plus the
//!   capability table
//! - `check` — evaluate one transition request
//! - `capabilities` — capability flags for one state
//!
//! Handlers write to a caller-supplied writer and delegate every decision
//! to `rental-state`.

pub mod capabilities;
pub mod check;
pub mod matrix;

use clap::ValueEnum;

/// Output format shared by the reporting subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain-text table.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
