//! Skill normalization and extraction.
//!
//! `normalize_skill` maps free-text skill strings into a canonical key space
//! so user and job skill sets become comparable. `extract_skills` scans job
//! text for the configured vocabulary and returns curated display names.
//! Both operate on the tables in [`crate::heuristics::Heuristics`].

use crate::heuristics::SkillTables;

/// Canonicalizes a raw skill string: lowercase, trim, `-`/`_`/`.` to spaces,
/// collapse whitespace, then alias lookup. Unmapped strings pass through
/// after the basic cleanup. Empty input yields an empty string.
///
/// Idempotent: normalizing an already-canonical key returns it unchanged.
pub fn normalize_skill(raw: &str, tables: &SkillTables) -> String {
    let cleaned = raw
        .to_lowercase()
        .replace(['-', '_', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        return String::new();
    }

    match tables.aliases.get(&cleaned) {
        Some(canonical) => canonical.clone(),
        None => cleaned,
    }
}

/// Extracts skills from job text by case-insensitive substring match against
/// the vocabulary. Returns display names, deduplicated in vocabulary order.
pub fn extract_skills(text: &str, tables: &SkillTables) -> Vec<String> {
    let text_lower = text.to_lowercase();
    let mut found: Vec<String> = Vec::new();

    for entry in &tables.vocabulary {
        if text_lower.contains(entry.term.as_str()) {
            let display = entry
                .display
                .clone()
                .unwrap_or_else(|| title_case(&entry.term));
            if !found.contains(&display) {
                found.push(display);
            }
        }
    }

    found
}

/// Uppercases the first letter of every alphabetic run ("rest api" →
/// "Rest Api"). Vocabulary entries with nonstandard casing carry an
/// explicit display override instead.
fn title_case(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    let mut at_word_start = true;
    for ch in term.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::Heuristics;

    fn tables() -> crate::heuristics::SkillTables {
        Heuristics::default().skills
    }

    #[test]
    fn test_normalize_lowercases_and_trims() {
        let t = tables();
        assert_eq!(normalize_skill("  Python ", &t), "python");
    }

    #[test]
    fn test_normalize_maps_aliases() {
        let t = tables();
        assert_eq!(normalize_skill("Node.js", &t), "nodejs");
        assert_eq!(normalize_skill("node_js", &t), "nodejs");
        assert_eq!(normalize_skill("C++", &t), "cpp");
        assert_eq!(normalize_skill("Machine Learning", &t), "ml");
        assert_eq!(normalize_skill("scikit-learn", &t), "scikitlearn");
    }

    #[test]
    fn test_normalize_unmapped_passes_through() {
        let t = tables();
        assert_eq!(normalize_skill("Erlang", &t), "erlang");
        assert_eq!(normalize_skill("apache-beam", &t), "apache beam");
    }

    #[test]
    fn test_normalize_empty_input_yields_empty() {
        let t = tables();
        assert_eq!(normalize_skill("", &t), "");
        assert_eq!(normalize_skill("   ", &t), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let t = tables();
        for raw in ["Node.js", "C++", "Machine Learning", "Erlang", "ci/cd"] {
            let once = normalize_skill(raw, &t);
            let twice = normalize_skill(&once, &t);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_extract_finds_vocabulary_terms() {
        let t = tables();
        let skills = extract_skills(
            "We need Python and Docker experience, plus CI/CD pipelines.",
            &t,
        );
        assert!(skills.contains(&"Python".to_string()));
        assert!(skills.contains(&"Docker".to_string()));
        assert!(skills.contains(&"CI/CD".to_string()));
    }

    #[test]
    fn test_extract_uses_display_overrides() {
        let t = tables();
        let skills = extract_skills("Experience with node.js and AWS required", &t);
        assert!(skills.contains(&"Node.js".to_string()));
        assert!(skills.contains(&"AWS".to_string()));
    }

    #[test]
    fn test_extract_dedupes_shared_display_names() {
        let t = tables();
        // "nlp" and "natural language processing" share the NLP display name
        let skills = extract_skills("nlp / natural language processing role", &t);
        assert_eq!(
            skills.iter().filter(|s| s.as_str() == "NLP").count(),
            1
        );
    }

    #[test]
    fn test_extract_empty_text_yields_nothing() {
        let t = tables();
        assert!(extract_skills("", &t).is_empty());
    }

    #[test]
    fn test_title_case_default_rendering() {
        assert_eq!(title_case("rest api"), "Rest Api");
        assert_eq!(title_case("smart contracts"), "Smart Contracts");
    }
}
