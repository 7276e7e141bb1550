//! Language-consistency hook: British/American spelling collisions.
//!
//! Scans body text (heading lines are skipped) against a fixed dictionary
//! of spelling pairs and reports one issue per distinct word written in the
//! non-preferred style, with the preferred spelling as the suggestion and
//! the occurrence count in `stats`.

use std::collections::BTreeMap;

use super::types::{HookConfig, HookInput, HookIssue, HookKind, HookResult, Severity, SpellingStyle};

/// Fixed (british, american) spelling pairs, research vocabulary included.
const SPELLING_PAIRS: &[(&str, &str)] = &[
    ("analyse", "analyze"),
    ("analysed", "analyzed"),
    ("anaemia", "anemia"),
    ("anaesthesia", "anesthesia"),
    ("behaviour", "behavior"),
    ("centre", "center"),
    ("colour", "color"),
    ("characterise", "characterize"),
    ("characterised", "characterized"),
    ("favour", "favor"),
    ("foetal", "fetal"),
    ("haemorrhage", "hemorrhage"),
    ("haemoglobin", "hemoglobin"),
    ("labelled", "labeled"),
    ("licence", "license"),
    ("litre", "liter"),
    ("metre", "meter"),
    ("minimise", "minimize"),
    ("modelling", "modeling"),
    ("oedema", "edema"),
    ("oesophageal", "esophageal"),
    ("organise", "organize"),
    ("organised", "organized"),
    ("paediatric", "pediatric"),
    ("programme", "program"),
    ("randomise", "randomize"),
    ("randomised", "randomized"),
    ("randomisation", "randomization"),
    ("standardise", "standardize"),
    ("standardised", "standardized"),
    ("summarise", "summarize"),
    ("summarised", "summarized"),
    ("tumour", "tumor"),
    ("utilise", "utilize"),
];

pub fn run(input: &HookInput, config: &HookConfig) -> HookResult {
    // offending spelling -> (preferred spelling, occurrence count)
    let mut offenders: BTreeMap<&'static str, (&'static str, u64)> = BTreeMap::new();

    for line in input.text.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for token in line
            .split(|c: char| !c.is_alphabetic())
            .filter(|t| !t.is_empty())
        {
            let lowered = token.to_lowercase();
            for (british, american) in SPELLING_PAIRS {
                let (offending, preferred) = match config.preferred_spelling {
                    SpellingStyle::American => (*british, *american),
                    SpellingStyle::British => (*american, *british),
                };
                if lowered == offending {
                    offenders
                        .entry(offending)
                        .and_modify(|(_, n)| *n += 1)
                        .or_insert((preferred, 1));
                }
            }
        }
    }

    let mut result = HookResult::from_issues(
        HookKind::LanguageConsistency,
        offenders
            .iter()
            .map(|(word, (preferred, count))| {
                let mut issue = HookIssue::new(
                    HookKind::LanguageConsistency,
                    Severity::Warning,
                    format!("'{word}' appears {count} time(s); manuscript style is {}",
                        match config.preferred_spelling {
                            SpellingStyle::American => "American",
                            SpellingStyle::British => "British",
                        }),
                )
                .with_location((*word).to_string())
                .with_suggestion((*preferred).to_string());
                if let Some(section) = &input.section {
                    issue = issue.with_section(section.clone());
                }
                issue
            })
            .collect(),
    );
    for (word, (_, count)) in &offenders {
        result.stats.insert((*word).to_string(), *count as f64);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_passes() {
        let input = HookInput::text("The randomized trial analyzed tumor behavior.");
        let result = run(&input, &HookConfig::default());
        assert!(result.passed);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_british_spelling_flagged_under_american_preference() {
        let input = HookInput::text(
            "Patients were randomised into two groups. The randomised allocation used sealed envelopes. We analysed tumour size.",
        );
        let result = run(&input, &HookConfig::default());
        assert!(!result.passed);

        // One issue per distinct offending word, not per occurrence.
        let words: Vec<_> = result
            .issues
            .iter()
            .map(|i| i.location.as_deref().unwrap())
            .collect();
        assert_eq!(words, vec!["analysed", "randomised", "tumour"]);
        assert_eq!(result.stats.get("randomised"), Some(&2.0));

        let randomised = result
            .issues
            .iter()
            .find(|i| i.location.as_deref() == Some("randomised"))
            .unwrap();
        assert_eq!(randomised.suggestion.as_deref(), Some("randomized"));
        assert_eq!(randomised.severity, Severity::Warning);
    }

    #[test]
    fn test_heading_lines_are_skipped() {
        let input = HookInput::text("# Colour and Behaviour in Headings\n\nPlain body text.");
        let result = run(&input, &HookConfig::default());
        assert!(result.passed);
    }

    #[test]
    fn test_british_preference_flags_american_forms() {
        let config = HookConfig {
            preferred_spelling: SpellingStyle::British,
            ..HookConfig::default()
        };
        let input = HookInput::text("The randomized cohort was analyzed.");
        let result = run(&input, &config);
        assert!(!result.passed);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].suggestion.as_deref(), Some("analysed"));
    }

    #[test]
    fn test_matching_is_case_insensitive_and_word_bounded() {
        let input = HookInput::text("Tumour burden. The contumourious word is not a match.");
        let result = run(&input, &HookConfig::default());
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.stats.get("tumour"), Some(&1.0));
    }

    #[test]
    fn test_section_carried_onto_issues() {
        let input = HookInput::text("The colour scale.").with_section("Results");
        let result = run(&input, &HookConfig::default());
        assert_eq!(result.issues[0].section.as_deref(), Some("Results"));
    }
}
