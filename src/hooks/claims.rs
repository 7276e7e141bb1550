//! Data-claim alignment hook: results vs. methods consistency.
//!
//! `input.text` is the results text, `input.sibling` the methods text.
//! Statistical-test mentions found in results but absent from methods are
//! undeclared-test issues. P-value thresholds, confidence-interval widths,
//! and analysis-software mentions are compared separately between the two
//! texts.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use super::types::{HookConfig, HookInput, HookIssue, HookKind, HookResult, Severity};

/// (canonical name, detection pattern) for statistical tests.
const TEST_PATTERNS: &[(&str, &str)] = &[
    ("t-test", r"(?i)\bt[- ]tests?\b"),
    ("ANOVA", r"(?i)\banovas?\b"),
    ("chi-square", r"(?i)\bchi[- ]squared?\b"),
    ("Mann-Whitney", r"(?i)\bmann[- ]whitney\b"),
    ("Wilcoxon", r"(?i)\bwilcoxon\b"),
    ("Kruskal-Wallis", r"(?i)\bkruskal[- ]wallis\b"),
    ("Fisher's exact", r"(?i)\bfisher'?s?\s+exact\b"),
    ("linear regression", r"(?i)\blinear\s+regression\b"),
    ("logistic regression", r"(?i)\blogistic\s+regression\b"),
    ("Cox regression", r"(?i)\bcox\s+(?:regression|proportional[- ]hazards?)\b"),
    ("Pearson correlation", r"(?i)\bpearson\b"),
    ("Spearman correlation", r"(?i)\bspearman\b"),
    ("mixed-effects model", r"(?i)\bmixed[- ](?:effects?\s+)?models?\b"),
];

/// (canonical name, detection pattern) for analysis software.
const SOFTWARE_PATTERNS: &[(&str, &str)] = &[
    ("SPSS", r"(?i)\bSPSS\b"),
    ("SAS", r"(?i)\bSAS\b"),
    ("Stata", r"(?i)\bStata\b"),
    ("GraphPad Prism", r"(?i)\bGraphPad\s+Prism\b"),
    ("MATLAB", r"(?i)\bMATLAB\b"),
];

fn p_threshold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bp\s*[<≤]\s*(0?\.\d+)").unwrap())
}

fn ci_width_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{2})%\s*(?:confidence\s+intervals?|CI)\b").unwrap())
}

fn test_regexes() -> &'static Vec<(&'static str, Regex)> {
    static COMPILED: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        TEST_PATTERNS
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).unwrap()))
            .collect()
    })
}

fn mentioned_tests(text: &str) -> BTreeSet<&'static str> {
    test_regexes()
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

fn p_thresholds(text: &str) -> BTreeSet<String> {
    p_threshold_re()
        .captures_iter(text)
        .map(|c| {
            let raw = &c[1];
            if let Some(stripped) = raw.strip_prefix('.') {
                format!("0.{stripped}")
            } else {
                raw.to_string()
            }
        })
        .collect()
}

fn ci_widths(text: &str) -> BTreeSet<String> {
    ci_width_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

fn software_regexes() -> &'static Vec<(&'static str, Regex)> {
    static COMPILED: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        SOFTWARE_PATTERNS
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).unwrap()))
            .collect()
    })
}

fn software_mentions(text: &str) -> BTreeSet<&'static str> {
    software_regexes()
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

pub fn run(input: &HookInput, _config: &HookConfig) -> HookResult {
    let results_text = input.text.as_str();
    let methods_text = input.sibling.as_deref().unwrap_or("");

    let results_tests = mentioned_tests(results_text);
    let methods_tests = mentioned_tests(methods_text);

    let mut issues = Vec::new();

    for test in results_tests.difference(&methods_tests) {
        issues.push(
            HookIssue::new(
                HookKind::DataClaimAlignment,
                Severity::Warning,
                format!("'{test}' is reported in results but not declared in methods"),
            )
            .with_location((*test).to_string())
            .with_suggestion(format!("declare {test} in the statistical-analysis subsection")),
        );
    }

    let methods_p = p_thresholds(methods_text);
    let results_p = p_thresholds(results_text);
    if !methods_p.is_empty() && !results_p.is_empty() && !results_p.is_subset(&methods_p) {
        let extra: Vec<_> = results_p.difference(&methods_p).cloned().collect();
        issues.push(
            HookIssue::new(
                HookKind::DataClaimAlignment,
                Severity::Warning,
                format!(
                    "p-value threshold mismatch: results use p < {} not declared in methods (declared: {})",
                    extra.join(", "),
                    methods_p.iter().cloned().collect::<Vec<_>>().join(", ")
                ),
            )
            .with_location("p-value threshold".to_string()),
        );
    }

    let methods_ci = ci_widths(methods_text);
    let results_ci = ci_widths(results_text);
    if !methods_ci.is_empty() && !results_ci.is_empty() && !results_ci.is_subset(&methods_ci) {
        issues.push(
            HookIssue::new(
                HookKind::DataClaimAlignment,
                Severity::Warning,
                format!(
                    "confidence-interval width mismatch: results report {}% CI, methods declare {}%",
                    results_ci.iter().cloned().collect::<Vec<_>>().join("/"),
                    methods_ci.iter().cloned().collect::<Vec<_>>().join("/")
                ),
            )
            .with_location("confidence interval".to_string()),
        );
    }

    let methods_sw = software_mentions(methods_text);
    let results_sw = software_mentions(results_text);
    if !methods_sw.is_empty() && !results_sw.is_empty() && methods_sw != results_sw {
        issues.push(
            HookIssue::new(
                HookKind::DataClaimAlignment,
                Severity::Warning,
                format!(
                    "analysis-software mismatch: methods mention {}, results mention {}",
                    methods_sw.iter().copied().collect::<Vec<_>>().join("/"),
                    results_sw.iter().copied().collect::<Vec<_>>().join("/")
                ),
            )
            .with_location("analysis software".to_string()),
        );
    }

    HookResult::from_issues(HookKind::DataClaimAlignment, issues)
        .with_stat("results_tests", results_tests.len() as f64)
        .with_stat("methods_tests", methods_tests.len() as f64)
}
