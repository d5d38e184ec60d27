//! # Capabilities Subcommand
//!
//! Prints the capability flags of one loan state.
//!
//! ```text
//! rental capabilities ACTIVE
//! rental capabilities returned --format json
//! ```

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use rental_state::{CapabilityQuery, LoanStatus};

use crate::{yes_no, OutputFormat};

/// Arguments for `rental capabilities`.
#[derive(Args, Debug)]
pub struct CapabilitiesArgs {
    /// Loan status to inspect.
    pub status: LoanStatus,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Execute `rental capabilities`.
pub fn run_capabilities(args: &CapabilitiesArgs, out: &mut dyn Write) -> Result<()> {
    let caps = CapabilityQuery::snapshot(args.status);
    tracing::debug!(status = %args.status, "querying capabilities");

    match args.format {
        OutputFormat::Text => {
            let rows = [
                ("create_pickup_protocol", caps.create_pickup_protocol),
                ("update_pickup_protocol", caps.update_pickup_protocol),
                ("create_return_protocol", caps.create_return_protocol),
                ("update_return_protocol", caps.update_return_protocol),
                ("create_review", caps.create_review),
            ];
            writeln!(out, "{}", caps.status).context("failed to write capabilities")?;
            for (name, flag) in rows {
                writeln!(out, "  {name:<24} {}", yes_no(flag))
                    .context("failed to write capabilities")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &caps)
                .context("failed to serialize capabilities")?;
            writeln!(out).context("failed to write capabilities")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(status: LoanStatus, format: OutputFormat) -> String {
        let mut buf = Vec::new();
        run_capabilities(&CapabilitiesArgs { status, format }, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_lists_all_five_flags() {
        let text = render(LoanStatus::Accepted, OutputFormat::Text);
        assert!(text.starts_with("ACCEPTED\n"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("create_pickup_protocol   yes"));
        assert!(text.contains("create_return_protocol   no"));
        assert!(text.contains("create_review            no"));
    }

    #[test]
    fn review_opens_in_terminal_states() {
        for status in [LoanStatus::Returned, LoanStatus::Denied, LoanStatus::Cancelled] {
            let text = render(status, OutputFormat::Text);
            assert!(text.contains("create_review            yes"), "{status}");
        }
    }

    #[test]
    fn json_matches_snapshot() {
        let json = render(LoanStatus::Active, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ACTIVE");
        assert_eq!(value["create_return_protocol"], true);
        assert_eq!(value["update_return_protocol"], true);
        assert_eq!(value["create_pickup_protocol"], false);
        assert_eq!(value["create_review"], false);
    }
}
