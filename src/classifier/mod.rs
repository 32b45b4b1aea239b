//! Path classification.
//!
//! Maps a repository path to a security category and review priority, or
//! rejects it as irrelevant. Classification is a pure function of the path
//! string; file contents are never read.

pub mod rules;

use crate::models::{Category, ClassifiedFile, Priority};
pub use rules::{PathParts, RULES};

/// Classify a single path.
///
/// Returns `None` for empty input and for paths no rule matches.
pub fn classify(path: &str) -> Option<ClassifiedFile> {
    let parts = PathParts::parse(path)?;

    RULES.iter().find_map(|rule| {
        (rule.matches)(&parts).map(|reason| ClassifiedFile {
            path: path.trim().to_string(),
            category: rule.category,
            priority: assign_priority(rule.category, &parts),
            reason,
        })
    })
}

/// Priority depends on the category and location, not on which pattern matched.
pub fn assign_priority(category: Category, parts: &PathParts) -> Priority {
    match category {
        Category::Secret => Priority::High,
        Category::Dependency if parts.is_at_root() => Priority::High,
        Category::Config if parts.normalized.contains(rules::ENV_FILE_MARKER) => Priority::High,
        Category::Security | Category::Deployment => Priority::Medium,
        _ => Priority::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category_of(path: &str) -> Option<Category> {
        classify(path).map(|f| f.category)
    }

    #[test]
    fn test_classify_scenario_paths() {
        let env = classify(".env").unwrap();
        assert_eq!(env.category, Category::Secret);
        assert_eq!(env.priority, Priority::High);

        let secrets = classify("secrets.json").unwrap();
        assert_eq!(secrets.category, Category::Secret);
        assert_eq!(secrets.priority, Priority::High);

        let manifest = classify("package.json").unwrap();
        assert_eq!(manifest.category, Category::Dependency);
        assert_eq!(manifest.priority, Priority::High);

        let config = classify("config.json").unwrap();
        assert_eq!(config.category, Category::Config);
        assert_eq!(config.priority, Priority::Low);

        assert!(classify("README.md").is_none());
    }

    #[test]
    fn test_secret_takes_precedence_over_dependency() {
        // A manifest under an auth directory is claimed by the secret rule first.
        assert_eq!(
            category_of("services/auth/package.json"),
            Some(Category::Secret)
        );
    }

    #[test]
    fn test_security_takes_precedence_over_config() {
        assert_eq!(
            category_of("config/security.yaml"),
            Some(Category::Security)
        );
    }

    #[test]
    fn test_deployment_takes_precedence_over_config() {
        let file = classify("k8s/ingress.yaml").unwrap();
        assert_eq!(file.category, Category::Deployment);
        assert_eq!(file.priority, Priority::Medium);
    }

    #[test]
    fn test_nested_dependency_is_low_priority() {
        let file = classify("services/api/package.json").unwrap();
        assert_eq!(file.category, Category::Dependency);
        assert_eq!(file.priority, Priority::Low);
    }

    #[test]
    fn test_config_with_env_marker_is_high_priority() {
        let file = classify("app.env.yaml").unwrap();
        assert_eq!(file.category, Category::Config);
        assert_eq!(file.priority, Priority::High);
    }

    #[test]
    fn test_case_insensitive_and_preserves_original_path() {
        let file = classify("Docker/Dockerfile").unwrap();
        assert_eq!(file.category, Category::Deployment);
        assert_eq!(file.path, "Docker/Dockerfile");

        assert_eq!(category_of("PACKAGE.JSON"), Some(Category::Dependency));
    }

    #[test]
    fn test_windows_separators() {
        assert_eq!(
            category_of("deploy\\.github\\workflows\\ci.yml"),
            Some(Category::Deployment)
        );
    }

    #[test]
    fn test_irrelevant_and_malformed_paths() {
        assert!(classify("").is_none());
        assert!(classify("   ").is_none());
        assert!(classify("src/main.rs").is_none());
        assert!(classify("dist/security.js").is_none());
        assert!(classify("node_modules/lib/token.js").is_none());
    }

    #[test]
    fn test_every_match_has_reason() {
        let paths = [
            ".env.local",
            "id_rsa",
            "go.mod",
            "docs/SECURITY.md",
            "docker-compose.yml",
            "settings.ini",
        ];
        for path in paths {
            let file = classify(path).unwrap_or_else(|| panic!("{} should classify", path));
            assert!(!file.reason.is_empty(), "{} has empty reason", path);
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        for path in [".env", "pom.xml", "infra/terraform/main.tf", "x/y/z.txt"] {
            assert_eq!(classify(path), classify(path));
        }
    }
}
