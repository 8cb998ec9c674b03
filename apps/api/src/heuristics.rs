//! Heuristic tables — scoring weights/thresholds and the skill keyword
//! tables, carried as data rather than embedded constants.
//!
//! Defaults are compiled in; `HEURISTICS_PATH` may point at a TOML file that
//! overrides any subset of them. `AppState` holds one `Heuristics` instance
//! constructed at startup.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Weights and thresholds for the recommendation scorer.
///
/// The defaults reproduce the tuning the service shipped with. They are ad
/// hoc constants, not derived — override via the heuristics file to retune.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub similarity_weight: f32,
    pub skill_weight: f32,
    /// Multiplier applied to the skill ratio when no embedding similarity
    /// is available (skill-only boost branch).
    pub skill_only_boost: f32,
    /// Inclusion gate: keep a candidate when similarity exceeds this.
    pub include_similarity_floor: f32,
    /// Inclusion gate: keep a candidate when the combined score exceeds this.
    pub include_combined_floor: f32,
    /// Stricter post-scoring filter applied by the recommendation endpoint.
    pub refine_similarity_floor: f32,
    pub refine_combined_floor: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.5,
            skill_weight: 0.5,
            skill_only_boost: 0.8,
            include_similarity_floor: 0.3,
            include_combined_floor: 0.1,
            refine_similarity_floor: 0.15,
            refine_combined_floor: 0.01,
        }
    }
}

/// One extraction vocabulary entry. `display` overrides the default
/// title-cased rendering for terms whose casing matters ("AI", "CI/CD").
#[derive(Debug, Clone, Deserialize)]
pub struct VocabTerm {
    pub term: String,
    #[serde(default)]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkillTables {
    /// Canonicalization aliases, keyed by the cleaned-up form of a skill
    /// string (lowercased, `-`/`_`/`.` replaced with spaces).
    pub aliases: HashMap<String, String>,
    /// Case-insensitive substring vocabulary matched against job text.
    pub vocabulary: Vec<VocabTerm>,
}

impl Default for SkillTables {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            vocabulary: DEFAULT_VOCABULARY
                .iter()
                .map(|(term, display)| VocabTerm {
                    term: term.to_string(),
                    display: display.map(str::to_string),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    pub scoring: ScoringConfig,
    pub skills: SkillTables,
}

impl Heuristics {
    /// Loads heuristics from `path`, or the compiled-in defaults when no
    /// path is configured. A missing or malformed file is a startup error,
    /// not a silent fallback.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading heuristics file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing heuristics file {}", p.display()))
            }
        }
    }
}

/// Alias table mapping cleaned-up skill variants to one canonical key.
/// Entries mapping a key to itself pin the canonical spelling.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("node js", "nodejs"),
    ("nodejs", "nodejs"),
    ("machine learning", "ml"),
    ("artificial intelligence", "ai"),
    ("ai", "ai"),
    ("data science", "datascience"),
    ("datascience", "datascience"),
    ("javascript", "js"),
    ("js", "js"),
    ("typescript", "ts"),
    ("ts", "ts"),
    ("c++", "cpp"),
    ("cplusplus", "cpp"),
    ("cpp", "cpp"),
    ("expressjs", "express"),
    ("express js", "express"),
    ("express", "express"),
    ("fastapi", "fastapi"),
    ("fast api", "fastapi"),
    ("scikit learn", "scikitlearn"),
    ("scikitlearn", "scikitlearn"),
    ("llm models", "llm"),
    ("llm", "llm"),
    ("deep learning", "deeplearning"),
    ("deeplearning", "deeplearning"),
    ("prompt engineering", "promptengineering"),
    ("promptengineering", "promptengineering"),
];

/// Extraction vocabulary. Matching is case-insensitive substring search, so
/// terms are lowercase; `Some` display names override title-casing.
const DEFAULT_VOCABULARY: &[(&str, Option<&str>)] = &[
    // Programming languages
    ("python", None),
    ("javascript", None),
    ("java", None),
    ("typescript", None),
    ("c++", Some("C++")),
    ("c#", Some("C#")),
    ("go", None),
    ("rust", None),
    ("php", Some("PHP")),
    ("ruby", None),
    ("swift", None),
    ("kotlin", None),
    ("scala", None),
    ("matlab", Some("MATLAB")),
    ("perl", None),
    // Web frameworks
    ("react", None),
    ("vue", None),
    ("angular", None),
    ("node.js", Some("Node.js")),
    ("nodejs", Some("Node.js")),
    ("express", None),
    ("expressjs", Some("Express")),
    ("django", None),
    ("flask", None),
    ("fastapi", Some("FastAPI")),
    ("spring", None),
    ("asp.net", Some("ASP.NET")),
    ("laravel", None),
    ("rails", None),
    // Databases
    ("sql", Some("SQL")),
    ("mysql", Some("MySQL")),
    ("postgresql", Some("PostgreSQL")),
    ("mongodb", Some("MongoDB")),
    ("redis", None),
    ("cassandra", None),
    ("elasticsearch", None),
    ("dynamodb", Some("DynamoDB")),
    ("oracle", None),
    ("sqlite", Some("SQLite")),
    ("mariadb", Some("MariaDB")),
    // Cloud & DevOps
    ("aws", Some("AWS")),
    ("azure", None),
    ("gcp", Some("GCP")),
    ("docker", None),
    ("kubernetes", None),
    ("jenkins", None),
    ("terraform", None),
    ("ansible", None),
    ("ci/cd", Some("CI/CD")),
    ("github actions", Some("GitHub Actions")),
    ("gitlab", Some("GitLab")),
    // AI/ML
    ("machine learning", Some("Machine Learning")),
    ("ml", Some("Machine Learning")),
    ("artificial intelligence", Some("AI")),
    ("ai", Some("AI")),
    ("deep learning", Some("Deep Learning")),
    ("neural networks", None),
    ("tensorflow", Some("TensorFlow")),
    ("pytorch", Some("PyTorch")),
    ("keras", None),
    ("scikit-learn", Some("Scikit-Learn")),
    ("pandas", None),
    ("numpy", Some("NumPy")),
    ("nlp", Some("NLP")),
    ("natural language processing", Some("NLP")),
    ("computer vision", Some("Computer Vision")),
    ("llm", Some("LLM")),
    ("large language models", Some("LLM")),
    ("generative ai", Some("Generative AI")),
    ("gpt", Some("GPT")),
    ("transformer", None),
    ("prompt engineering", Some("Prompt Engineering")),
    ("rag", Some("RAG")),
    ("retrieval augmented generation", Some("RAG")),
    ("embeddings", None),
    // Blockchain
    ("blockchain", None),
    ("ethereum", None),
    ("solidity", None),
    ("smart contracts", Some("Smart Contracts")),
    ("web3", Some("Web3")),
    ("defi", Some("DeFi")),
    // Data engineering
    ("data science", Some("Data Science")),
    ("data analysis", Some("Data Analysis")),
    ("data engineering", Some("Data Engineering")),
    ("big data", Some("Big Data")),
    ("spark", None),
    ("hadoop", None),
    ("kafka", None),
    ("airflow", None),
    // Other tools
    ("git", None),
    ("github", Some("GitHub")),
    ("graphql", Some("GraphQL")),
    ("rest api", Some("REST API")),
    ("microservices", None),
    ("agile", None),
    ("scrum", None),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_scoring_matches_shipped_tuning() {
        let s = ScoringConfig::default();
        assert_eq!(s.similarity_weight, 0.5);
        assert_eq!(s.skill_weight, 0.5);
        assert_eq!(s.skill_only_boost, 0.8);
        assert_eq!(s.include_similarity_floor, 0.3);
        assert_eq!(s.include_combined_floor, 0.1);
        assert_eq!(s.refine_similarity_floor, 0.15);
        assert_eq!(s.refine_combined_floor, 0.01);
    }

    #[test]
    fn test_default_tables_nonempty() {
        let h = Heuristics::default();
        assert!(h.skills.vocabulary.len() >= 90);
        assert!(h.skills.aliases.contains_key("node js"));
        assert_eq!(h.skills.aliases["c++"], "cpp");
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let h = Heuristics::load(None).unwrap();
        assert_eq!(h.scoring.skill_only_boost, 0.8);
    }

    #[test]
    fn test_load_partial_override_keeps_defaults_elsewhere() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scoring]\nskill_only_boost = 0.9\n\n[skills]\naliases = {{ \"golang\" = \"go\" }}\n"
        )
        .unwrap();

        let h = Heuristics::load(Some(file.path())).unwrap();
        assert_eq!(h.scoring.skill_only_boost, 0.9);
        // untouched scoring fields fall back to defaults
        assert_eq!(h.scoring.include_similarity_floor, 0.3);
        assert_eq!(h.skills.aliases["golang"], "go");
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = Heuristics::load(Some(Path::new("/nonexistent/heuristics.toml")));
        assert!(result.is_err());
    }
}
