//! Supplementary cross-reference hook.
//!
//! Extracts "Supplementary Table/Figure N", "Appendix X", "eTable N", and
//! "eFigure N" mentions from text and cross-checks them against files in
//! the known supplementary directories. A mention with zero candidate
//! files of its kind is CRITICAL; candidates of the kind exist but none
//! carries the exact index is a lower-severity phantom reference.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use walkdir::WalkDir;

use super::types::{HookConfig, HookInput, HookIssue, HookKind, HookResult, Severity};

/// The artifact kinds a supplementary mention can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MentionKind {
    Table,
    Figure,
    Appendix,
    File,
}

impl MentionKind {
    fn keyword(&self) -> &'static str {
        match self {
            MentionKind::Table => "table",
            MentionKind::Figure => "figure",
            MentionKind::Appendix => "appendix",
            MentionKind::File => "file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Mention {
    kind: MentionKind,
    index: String,
    raw: String,
}

fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:(?:supplementary|supplemental|online)\s+(table|figure|file)s?|e(table|figure)|(appendix))\s*S?\s*([A-Z]\b|\d+)",
        )
        .unwrap()
    })
}

fn extract_mentions(text: &str) -> BTreeSet<Mention> {
    mention_re()
        .captures_iter(text)
        .filter_map(|c| {
            let kind_word = c
                .get(1)
                .or_else(|| c.get(2))
                .or_else(|| c.get(3))
                .map(|m| m.as_str().to_lowercase())?;
            let kind = match kind_word.as_str() {
                "table" => MentionKind::Table,
                "figure" => MentionKind::Figure,
                "file" => MentionKind::File,
                "appendix" => MentionKind::Appendix,
                _ => return None,
            };
            Some(Mention {
                kind,
                index: c[4].to_uppercase(),
                raw: c[0].trim().to_string(),
            })
        })
        .collect()
}

/// File stems found under the configured supplementary directories.
fn supplementary_stems(project_dir: &Path, config: &HookConfig) -> Vec<String> {
    let mut stems = Vec::new();
    for dir_name in &config.supplementary_dirs {
        let dir = project_dir.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                if let Some(stem) = entry.path().file_stem() {
                    stems.push(stem.to_string_lossy().to_lowercase());
                }
            }
        }
    }
    stems
}

/// True when the stem carries the index as its own token ("table-s3",
/// "etable3", "appendix_b").
fn stem_has_index(stem: &str, index: &str) -> bool {
    let index = index.to_lowercase();
    let tokens: Vec<String> = stem
        .split(|c: char| !c.is_alphanumeric())
        .flat_map(|t| {
            // split trailing digits off alphabetic prefixes: "etable3" -> ["etable", "3"]
            let boundary = t.find(|c: char| c.is_ascii_digit());
            match boundary {
                Some(i) if i > 0 => vec![t[..i].to_string(), t[i..].to_string()],
                _ => vec![t.to_string()],
            }
        })
        .filter(|t| !t.is_empty())
        .collect();
    tokens
        .iter()
        .any(|t| *t == index || t.strip_prefix('s') == Some(index.as_str()))
}

pub fn run(input: &HookInput, config: &HookConfig) -> HookResult {
    let mentions = extract_mentions(&input.text);
    let stems = input
        .project_dir
        .as_deref()
        .map(|dir| supplementary_stems(dir, config))
        .unwrap_or_default();

    let mut issues = Vec::new();
    for mention in &mentions {
        let keyword = mention.kind.keyword();
        let candidates: Vec<&String> = stems.iter().filter(|s| s.contains(keyword)).collect();

        if candidates.is_empty() {
            let mut issue = HookIssue::new(
                HookKind::SupplementaryCrossref,
                Severity::Critical,
                format!(
                    "'{}' has no candidate {keyword} files in the supplementary directories",
                    mention.raw
                ),
            )
            .with_location(mention.raw.clone());
            if let Some(section) = &input.section {
                issue = issue.with_section(section.clone());
            }
            issues.push(issue);
        } else if !candidates.iter().any(|s| stem_has_index(s, &mention.index)) {
            let mut issue = HookIssue::new(
                HookKind::SupplementaryCrossref,
                Severity::Warning,
                format!(
                    "phantom reference: '{}' matches no {keyword} file with index {}",
                    mention.raw, mention.index
                ),
            )
            .with_location(mention.raw.clone())
            .with_suggestion(format!(
                "add the {keyword} or renumber the mention (found: {})",
                candidates
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            if let Some(section) = &input.section {
                issue = issue.with_section(section.clone());
            }
            issues.push(issue);
        }
    }

    HookResult::from_issues(HookKind::SupplementaryCrossref, issues)
        .with_stat("mentions", mentions.len() as f64)
        .with_stat("supplementary_files", stems.len() as f64)
}
