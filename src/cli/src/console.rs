//! Console rendering of bridge events and reports.

use bridge::{AddressSummary, BridgeEvent, EventSink, NativeAccountInfo, TransferReport};
use colored::Colorize;
use primitives::{
    format_amount, format_delta, format_execution_address, BalanceSnapshot, CallSignature,
    ReconciliationResult, TransferOutcome, U256,
};

/// Prints bridge events as they happen.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::Connected { chain } => println!("{} {}", "Connected to:".green(), chain),
            BridgeEvent::MappingClaimSubmitted { native_address } => {
                println!("{} {}", "Claiming default account for".cyan(), native_address)
            }
            BridgeEvent::MappingEstablished {
                native_address,
                execution_address,
                state,
            } => println!(
                "{} {} -> {} ({:?})",
                "Mapped:".green(),
                native_address,
                format_execution_address(&execution_address),
                state
            ),
            BridgeEvent::SignatureResolved { signature } => {
                println!("{} {}", "Transfer signature:".cyan(), signature)
            }
            BridgeEvent::SignatureFallback { signature } => println!(
                "{} unknown signature {}, trying (H160, Amount)",
                "WARNING:".yellow(),
                signature
            ),
            BridgeEvent::TransferSkipped { signature } => println!(
                "{} {} is a native-only transfer, nothing to bridge",
                "Skipped:".yellow(),
                signature
            ),
            BridgeEvent::TransferSubmitted { call } => println!("{} {}", "Submitted:".cyan(), call),
            BridgeEvent::StatusChanged { state, block } => match block {
                Some(block) => println!("{} {:?} in {:?}", "Status:".cyan(), state, block),
                None => println!("{} {:?}", "Status:".cyan(), state),
            },
            BridgeEvent::DispatchFailed { error } => println!("{} {}", "Dispatch error:".red(), error),
            BridgeEvent::EventEmitted { event } => println!("  {} {}", "event".dimmed(), event),
            BridgeEvent::SnapshotTaken { label, snapshot } => {
                println!("{}", format!("Balances {}:", label).bold());
                print_snapshot(&snapshot);
            }
            BridgeEvent::TokenViewUnavailable { reason } => {
                println!("{} token view unavailable: {}", "WARNING:".yellow(), reason)
            }
            BridgeEvent::AnomalyDetected { anomaly } => println!("{} {}", "ANOMALY:".red().bold(), anomaly),
        }
    }
}

fn row(label: &str, value: impl std::fmt::Display) {
    println!("  {:<24} {}", label, value);
}

fn token_row(value: Option<U256>) -> String {
    value
        .map(format_amount)
        .unwrap_or_else(|| "unavailable".to_string())
}

pub fn print_snapshot(snapshot: &BalanceSnapshot) {
    row("native free", format_amount(snapshot.native_free));
    row("execution balance", format_amount(snapshot.execution_raw_balance));
    row("execution token view", token_row(snapshot.execution_token_balance));
}

pub fn print_signature(signature: &CallSignature) {
    row("variant", format!("{:?}", signature.variant));
    row("arguments", signature.arg_names.join(", "));
    row("types", signature.arg_type_hints.join(", "));
    row("bridging", signature.is_bridging());
}

pub fn print_outcome(outcome: &TransferOutcome) {
    let state = format!("{:?}", outcome.state);
    if outcome.is_success() {
        row("state", state.green());
    } else {
        row("state", state.red());
    }
    if let Some(block) = outcome.block_ref {
        row("block", format!("{:?}", block));
    }
    if let Some(error) = &outcome.error {
        row("error", error.red());
    }
    for event in &outcome.emitted_events {
        row("event", event);
    }
    for warning in &outcome.warnings {
        row("warning", warning.yellow());
    }
}

pub fn print_reconciliation(result: &ReconciliationResult) {
    row("native delta", format_delta(result.native_delta));
    row("execution delta", format_delta(result.execution_delta));
    match result.anomaly {
        Some(anomaly) => row("anomaly", anomaly.to_string().red().bold()),
        None => row("anomaly", "none".green()),
    }
}

pub fn print_report(report: &TransferReport) {
    match report {
        TransferReport::Skipped { signature, .. } => {
            println!("{} {}", "Transfer skipped:".yellow(), signature);
        }
        TransferReport::Completed {
            outcome,
            reconciliation,
            ..
        } => {
            println!("{}", "Outcome:".bold());
            print_outcome(outcome);
            println!("{}", "Reconciliation:".bold());
            print_reconciliation(reconciliation);
        }
    }
}

pub fn print_native_info(native_address: &str, info: &NativeAccountInfo) {
    println!("{} {}", "Account:".green(), native_address);
    row("free", format_amount(info.free));
    row("reserved", format_amount(info.reserved));
    row("nonce", info.nonce);
}

pub fn print_summary(summary: &AddressSummary) {
    println!("{} {}", "Account:".green(), summary.account.native_address);
    row(
        "execution address",
        summary
            .account
            .execution_address
            .map(|a| format_execution_address(&a))
            .unwrap_or_else(|| "unmapped".to_string()),
    );
    row("mapping", format!("{:?}", summary.account.mapping_state));
    row("native free", format_amount(summary.native_free));
    row("native reserved", format_amount(summary.native_reserved));
    row("nonce", summary.nonce);
    row("execution balance", format_amount(summary.execution_raw_balance));
    row("execution token view", token_row(summary.execution_token_balance));
    match &summary.reverse_mapping {
        Some(native) => row("reverse mapping", native),
        None => row("reverse mapping", "none".yellow()),
    }
    if let Some(anomaly) = summary.anomaly {
        row("anomaly", anomaly.to_string().red().bold());
    }
}
