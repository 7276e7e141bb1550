//! Writing-quality hook command — `quillgate hooks <file>`.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use quillgate::hooks::{
    run_hook, run_post_manuscript_hooks, HookConfig, HookInput, HookKind, HookResult, Severity,
};

pub fn cmd_hooks(
    project_dir: &Path,
    file: &Path,
    hook: Option<&str>,
    sibling: Option<&Path>,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let section = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut input = HookInput::text(text)
        .with_section(&section)
        .with_project_dir(project_dir);
    if let Some(sibling) = sibling {
        let sibling_text = std::fs::read_to_string(sibling)
            .with_context(|| format!("Failed to read {}", sibling.display()))?;
        input = input.with_sibling(sibling_text);
    }

    let config = HookConfig::default();
    let results: BTreeMap<HookKind, HookResult> = match hook {
        Some(name) => {
            let kind: HookKind = name.parse()?;
            let mut results = BTreeMap::new();
            results.insert(kind, run_hook(kind, &input, &config));
            results
        }
        None => run_post_manuscript_hooks(&input, &config),
    };

    let mut any_failed = false;
    println!();
    for (kind, result) in &results {
        if result.passed {
            println!("  {} {}", console::style("ok  ").green(), kind);
            continue;
        }
        any_failed = true;
        println!("  {} {}", console::style("FAIL").red(), kind);
        for issue in &result.issues {
            let severity = match issue.severity {
                Severity::Critical => console::style("CRITICAL").red().bold(),
                Severity::Warning => console::style("WARNING ").yellow(),
                Severity::Info => console::style("INFO    ").dim(),
            };
            println!("       {} {}", severity, issue.message);
            if let Some(suggestion) = &issue.suggestion {
                println!(
                    "                {}",
                    console::style(format!("suggestion: {suggestion}")).dim()
                );
            }
        }
    }
    println!();

    if any_failed {
        std::process::exit(1);
    }
    Ok(())
}
