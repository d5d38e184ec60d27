//! # Matrix Subcommand
//!
//! Prints the whole transition table: for every state and every actor,
//! the targets the policy allows and any protocol the target requires,
//! followed by the capability flags of each state.
//!
//! ```text
//! rental matrix
//! rental matrix --format json
//! ```

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use rental_state::{
    ActorRole, Capabilities, CapabilityQuery, LoanStatus, Precondition, ProtocolGuard,
    Transition, TransitionPolicy,
};

use crate::{yes_no, OutputFormat};

/// Arguments for `rental matrix`.
#[derive(Args, Debug)]
pub struct MatrixArgs {
    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

// ─── Report ──────────────────────────────────────────────────────────

/// One allowed target, with the protocol it needs if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetEntry {
    pub status: LoanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires: Option<Precondition>,
}

/// Allowed targets for one (state, actor) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    pub state: LoanStatus,
    pub actor: ActorRole,
    pub targets: Vec<TargetEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixReport {
    pub transitions: Vec<MatrixRow>,
    pub capabilities: Vec<Capabilities>,
}

impl MatrixReport {
    /// Build the report from the policy table, states in lifecycle order
    /// and owner before tenant.
    pub fn build() -> Self {
        let transitions = LoanStatus::ALL
            .into_iter()
            .flat_map(|state| ActorRole::ALL.into_iter().map(move |actor| (state, actor)))
            .map(|(state, actor)| MatrixRow {
                state,
                actor,
                targets: TransitionPolicy::of(state)
                    .allowed_targets(actor)
                    .into_iter()
                    .map(|to| TargetEntry {
                        status: to,
                        requires: guard_for(state, to, actor),
                    })
                    .collect(),
            })
            .collect();

        let capabilities = LoanStatus::ALL
            .into_iter()
            .map(CapabilityQuery::snapshot)
            .collect();

        Self {
            transitions,
            capabilities,
        }
    }
}

fn guard_for(from: LoanStatus, to: LoanStatus, actor: ActorRole) -> Option<Precondition> {
    let transition = Transition::new(from, to, actor);
    if ProtocolGuard::is_coupled(&transition) {
        ProtocolGuard::requirement_for(to)
    } else {
        None
    }
}

fn annotation(precondition: Precondition) -> &'static str {
    match precondition {
        Precondition::PickupProtocolRequired => "requires pickup protocol",
        Precondition::ReturnProtocolRequired => "requires return protocol",
    }
}

// ─── Rendering ───────────────────────────────────────────────────────

fn render_text(report: &MatrixReport, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{:<22} {:<7} ALLOWED TARGETS", "STATE", "ACTOR")?;
    for row in &report.transitions {
        let targets: Vec<String> = row
            .targets
            .iter()
            .map(|entry| match entry.requires {
                Some(p) => format!("{} ({})", entry.status, annotation(p)),
                None => entry.status.to_string(),
            })
            .collect();
        writeln!(
            out,
            "{:<22} {:<7} {}",
            row.state.as_str(),
            row.actor.as_str(),
            targets.join(", ")
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<22} {:<8} {:<8} {:<8} {:<8} {:<8}",
        "STATE", "PICKUP+", "PICKUP~", "RETURN+", "RETURN~", "REVIEW+"
    )?;
    for caps in &report.capabilities {
        writeln!(
            out,
            "{:<22} {:<8} {:<8} {:<8} {:<8} {:<8}",
            caps.status.as_str(),
            yes_no(caps.create_pickup_protocol),
            yes_no(caps.update_pickup_protocol),
            yes_no(caps.create_return_protocol),
            yes_no(caps.update_return_protocol),
            yes_no(caps.create_review),
        )?;
    }
    writeln!(out)?;
    writeln!(out, "+ create, ~ update")?;
    Ok(())
}

/// Execute `rental matrix`.
pub fn run_matrix(args: &MatrixArgs, out: &mut dyn Write) -> Result<()> {
    let report = MatrixReport::build();
    tracing::debug!(
        rows = report.transitions.len(),
        format = ?args.format,
        "rendering transition matrix"
    );

    match args.format {
        OutputFormat::Text => render_text(&report, out).context("failed to write matrix")?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)
                .context("failed to serialize matrix")?;
            writeln!(out).context("failed to write matrix")?;
        }
    }
    Ok(())
}
