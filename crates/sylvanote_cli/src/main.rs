//! Vault smoke entry point.
//!
//! # Responsibility
//! - Load a record vault through `sylvanote_core` and print a summary.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `sylvanote <vault-dir>`. Set `SYLVANOTE_LOG_DIR` (absolute) to
//! enable file logging and `SYLVANOTE_LOG_LEVEL` to override the level.

use std::process::ExitCode;
use sylvanote_core::{
    core_version, default_log_level, init_logging, GraphService, TopologyEdgeKind,
    VaultGraphRepository,
};

fn main() -> ExitCode {
    let Some(vault_dir) = std::env::args().nth(1) else {
        eprintln!("usage: sylvanote <vault-dir>");
        return ExitCode::from(2);
    };

    if let Ok(log_dir) = std::env::var("SYLVANOTE_LOG_DIR") {
        let level = std::env::var("SYLVANOTE_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let service = match GraphService::load(VaultGraphRepository::new(vault_dir)) {
        Ok(service) => service,
        Err(err) => {
            log::error!("event=cli_load module=cli status=error error={err}");
            eprintln!("failed to load vault: {err}");
            return ExitCode::FAILURE;
        }
    };

    let engine = service.engine();
    let topology = service.family_topology();
    println!("sylvanote_core version={}", core_version());
    println!(
        "people={} events={} relationships={} skipped={}",
        engine.person_count(),
        engine.event_count(),
        engine.relationship_count(),
        service.skipped().len()
    );
    println!(
        "unions={} spouse_edges={}",
        topology.union_nodes().count(),
        topology.edges_of(TopologyEdgeKind::Spouse).count()
    );
    for skipped in service.skipped() {
        println!("skipped {}: {}", skipped.source, skipped.reason);
    }
    ExitCode::SUCCESS
}
