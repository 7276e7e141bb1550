//! Overlap-detection hook: near-duplicate paragraph pairs.
//!
//! Paragraphs are tokenized into word shingles of `min_ngram` size.
//! Paragraphs with fewer than `overlap_threshold` shingles are skipped.
//! A pair sharing at least `overlap_threshold` shingles is flagged;
//! sharing at or above twice the threshold is CRITICAL (near-duplicate),
//! otherwise WARNING.

use std::collections::HashSet;

use super::types::{HookConfig, HookInput, HookIssue, HookKind, HookResult, Severity};

fn shingles(paragraph: &str, n: usize) -> HashSet<String> {
    let words: Vec<String> = paragraph
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.len() < n {
        return HashSet::new();
    }
    words.windows(n).map(|w| w.join(" ")).collect()
}

pub fn run(input: &HookInput, config: &HookConfig) -> HookResult {
    let paragraphs: Vec<&str> = input
        .text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.starts_with('#'))
        .collect();

    let shingle_sets: Vec<(usize, HashSet<String>)> = paragraphs
        .iter()
        .enumerate()
        .map(|(i, p)| (i, shingles(p, config.min_ngram)))
        .filter(|(_, s)| s.len() >= config.overlap_threshold)
        .collect();

    let mut issues = Vec::new();
    let mut flagged_pairs = 0u64;

    for (a, (idx_a, set_a)) in shingle_sets.iter().enumerate() {
        for (idx_b, set_b) in shingle_sets.iter().skip(a + 1).map(|(i, s)| (i, s)) {
            let shared = set_a.intersection(set_b).count();
            if shared < config.overlap_threshold {
                continue;
            }
            flagged_pairs += 1;
            let severity = if shared >= 2 * config.overlap_threshold {
                Severity::Critical
            } else {
                Severity::Warning
            };
            let mut issue = HookIssue::new(
                HookKind::OverlapDetection,
                severity,
                format!(
                    "paragraphs {} and {} share {shared} {}-word shingles",
                    idx_a + 1,
                    idx_b + 1,
                    config.min_ngram
                ),
            )
            .with_location(format!("paragraphs {}/{}", idx_a + 1, idx_b + 1));
            if let Some(section) = &input.section {
                issue = issue.with_section(section.clone());
            }
            issues.push(issue);
        }
    }

    HookResult::from_issues(HookKind::OverlapDetection, issues)
        .with_stat("paragraphs", paragraphs.len() as f64)
        .with_stat("flagged_pairs", flagged_pairs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forty_words() -> String {
        (0..40)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_identical_paragraphs_are_critical() {
        let paragraph = forty_words();
        let input = HookInput::text(format!("{paragraph}\n\n{paragraph}"));
        let config = HookConfig {
            min_ngram: 6,
            overlap_threshold: 3,
            ..HookConfig::default()
        };

        let result = run(&input, &config);
        assert!(!result.passed);
        assert_eq!(result.stats.get("flagged_pairs"), Some(&1.0));
        assert_eq!(result.issues.len(), 1);
        // 35 shared shingles >= 2x threshold: near-duplicate
        assert_eq!(result.issues[0].severity, Severity::Critical);
    }

    #[test]
    fn test_distinct_paragraphs_pass() {
        let a = forty_words();
        let b = (100..140)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let input = HookInput::text(format!("{a}\n\n{b}"));
        let result = run(&input, &HookConfig::default());
        assert!(result.passed);
        assert_eq!(result.stats.get("flagged_pairs"), Some(&0.0));
        assert_eq!(result.stats.get("paragraphs"), Some(&2.0));
    }

    #[test]
    fn test_short_paragraphs_are_skipped() {
        // Below min_ngram words: zero shingles, never compared.
        let input = HookInput::text("same five words here now\n\nsame five words here now");
        let result = run(&input, &HookConfig::default());
        assert!(result.passed);
    }

    #[test]
    fn test_moderate_overlap_is_warning() {
        // Shared run of 9 words yields 4 shared 6-shingles: >= 3, < 6.
        let shared = "alpha beta gamma delta epsilon zeta eta theta iota";
        let a = format!("{shared} one two three four five six seven eight nine ten");
        let b = format!("{shared} red orange yellow green blue indigo violet pink grey");
        let input = HookInput::text(format!("{a}\n\n{b}"));
        let config = HookConfig {
            min_ngram: 6,
            overlap_threshold: 3,
            ..HookConfig::default()
        };

        let result = run(&input, &config);
        assert!(!result.passed);
        assert_eq!(result.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_heading_paragraphs_ignored() {
        let paragraph = forty_words();
        let input = HookInput::text(format!("# {paragraph}\n\n{paragraph}"));
        let result = run(&input, &HookConfig::default());
        // Heading copy is skipped; only one body paragraph remains.
        assert!(result.passed);
        assert_eq!(result.stats.get("paragraphs"), Some(&1.0));
    }

    #[test]
    fn test_punctuation_does_not_break_matching() {
        let a = "the quick brown fox jumps over the lazy dog again today";
        let b = "the quick, brown fox jumps over the lazy dog again today!";
        let input = HookInput::text(format!("{a}\n\n{b}"));
        let result = run(&input, &HookConfig::default());
        assert!(!result.passed);
    }
}
