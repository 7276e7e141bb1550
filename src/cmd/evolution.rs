//! Constraint-evolution commands — `quillgate evolution {list|verify|apply|dismiss}`.

use anyhow::Result;
use std::path::Path;

use quillgate::config::ProjectConfig;
use quillgate::evolution::{EvolutionVerifier, PendingEvolutionStore};

use super::super::EvolutionCommands;

pub fn cmd_evolution(project_dir: &Path, command: EvolutionCommands) -> Result<()> {
    match command {
        EvolutionCommands::List { pending } => cmd_list(project_dir, pending),
        EvolutionCommands::Verify { root } => {
            cmd_verify(root.as_deref().unwrap_or(project_dir));
            Ok(())
        }
        EvolutionCommands::Apply { id } => {
            let mut store = PendingEvolutionStore::new(&ProjectConfig::new(project_dir));
            store.mark_applied(&id, "cli")?;
            println!("{id} applied");
            Ok(())
        }
        EvolutionCommands::Dismiss { id } => {
            let mut store = PendingEvolutionStore::new(&ProjectConfig::new(project_dir));
            store.mark_dismissed(&id, "cli")?;
            println!("{id} dismissed");
            Ok(())
        }
    }
}

fn cmd_list(project_dir: &Path, pending_only: bool) -> Result<()> {
    let store = PendingEvolutionStore::new(&ProjectConfig::new(project_dir));
    let items: Vec<_> = store
        .all_items()
        .iter()
        .filter(|i| !pending_only || i.status == quillgate::evolution::EvolutionStatus::Pending)
        .collect();

    if items.is_empty() {
        println!();
        println!("No evolution items.");
        println!();
        return Ok(());
    }

    println!();
    println!("{:<10} {:<12} {:<24} Source", "Id", "Status", "Type");
    for item in items {
        println!(
            "{:<10} {:<12} {:<24} {}",
            item.id,
            console::style(item.status.as_str()).dim(),
            item.item_type,
            item.source
        );
    }
    println!();
    Ok(())
}

fn cmd_verify(root: &Path) {
    let report = EvolutionVerifier::verify(root);

    println!();
    println!(
        "Evolution evidence across {} project(s) under {}",
        report.projects.len(),
        root.display()
    );
    println!();
    for indicator in &report.indicators {
        let marker = if indicator.satisfied {
            console::style("ok  ").green()
        } else {
            console::style("MISS").red()
        };
        println!(
            "  {} {}  {} ({})",
            marker,
            indicator.id,
            indicator.description,
            console::style(&indicator.evidence).dim()
        );
    }
    println!();
    println!(
        "Verdict: {}",
        console::style(report.verdict.as_str()).bold()
    );
    println!();
}
