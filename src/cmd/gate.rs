//! Gate and checkpoint commands — `quillgate status`, `validate`,
//! `structure`, and `recover`.

use anyhow::Result;
use std::path::Path;

use quillgate::checkpoint::CheckpointManager;
use quillgate::config::ProjectConfig;
use quillgate::gates::{GateResult, PhaseGateValidator};
use quillgate::phase::Phase;

pub fn cmd_status(project_dir: &Path) -> Result<()> {
    let validator = PhaseGateValidator::new(ProjectConfig::new(project_dir));
    let report = validator.get_pipeline_status();

    println!();
    println!("Pipeline status for {}", project_dir.display());
    println!();
    for phase in &report.phases {
        let phase_enum = Phase::from_number(phase.phase)?;
        let marker = if phase.passed {
            console::style("PASS").green()
        } else {
            console::style("FAIL").red()
        };
        println!(
            "  {} Phase {:>4}  {}",
            marker,
            phase_enum.display_number(),
            phase.phase_name
        );
        for check in &phase.failed_checks {
            println!("         {}", console::style(check).dim());
        }
    }
    println!();
    println!("Completion: {:.0}%", report.completion_percent);
    println!();
    Ok(())
}

pub fn cmd_validate(project_dir: &Path, phase: &str) -> Result<()> {
    let phase: Phase = phase.parse()?;
    let validator = PhaseGateValidator::new(ProjectConfig::new(project_dir));
    let result = validator.validate_phase(phase);
    print_gate_result(&result);
    if !result.passed {
        std::process::exit(1);
    }
    Ok(())
}

pub fn cmd_structure(project_dir: &Path) -> Result<()> {
    let validator = PhaseGateValidator::new(ProjectConfig::new(project_dir));
    let result = validator.validate_project_structure();
    print_gate_result(&result);
    if !result.passed {
        std::process::exit(1);
    }
    Ok(())
}

pub fn cmd_recover(project_dir: &Path) -> Result<()> {
    let manager = CheckpointManager::new(ProjectConfig::new(project_dir));
    println!("{}", manager.get_recovery_summary());
    Ok(())
}

fn print_gate_result(result: &GateResult) {
    println!();
    println!("{}", result.phase_name);
    for check in &result.checks {
        let marker = if check.passed {
            console::style("ok  ").green()
        } else {
            console::style("FAIL").red()
        };
        print!("  {} {:<28} {}", marker, check.name, check.description);
        if let Some(details) = &check.details {
            print!(" ({})", console::style(details).dim());
        }
        println!();
    }
    println!();
    if result.passed {
        println!("{}", console::style("Gate passed").green().bold());
    } else {
        println!("{}", console::style("Gate failed").red().bold());
    }
    println!();
}
