//! Ordered classification rules.
//!
//! Each rule pairs a [`Category`] with a predicate over a normalized path.
//! Rules are evaluated in table order and the first match wins, so the table
//! order *is* the category precedence.

use crate::models::Category;

/// Exact file names of well-known secret and key material files.
pub const SECRET_FILES: &[&str] = &[
    "secrets.json",
    "secrets.yaml",
    "secrets.yml",
    "secrets.toml",
    "credentials.json",
    "credentials.yml",
    "credentials",
    "service-account.json",
    ".npmrc",
    ".pypirc",
    ".netrc",
    ".htpasswd",
    ".pgpass",
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    "keystore.jks",
];

/// File-name prefixes of environment files (`.env`, `.env.local`, ...).
pub const SECRET_FILE_PREFIXES: &[&str] = &[".env"];

/// Keywords that mark a path as secret-bearing anywhere in the path.
pub const SECRET_KEYWORDS: &[&str] = &["secret", "key", "token", "credential", "password", "auth"];

/// Package manifests and lock files across ecosystems.
pub const DEPENDENCY_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "requirements.txt",
    "requirements-dev.txt",
    "pipfile",
    "pipfile.lock",
    "pyproject.toml",
    "poetry.lock",
    "setup.py",
    "gemfile",
    "gemfile.lock",
    "cargo.toml",
    "cargo.lock",
    "go.mod",
    "go.sum",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "composer.json",
    "composer.lock",
];

pub const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "cors",
    "csrf",
    "firewall",
    "policy",
    "policies",
    "permission",
    "rbac",
    "ssl",
    "tls",
    "cert",
    "sanitiz",
    "helmet",
    "encrypt",
];

pub const DEPLOYMENT_KEYWORDS: &[&str] = &[
    "dockerfile",
    "docker-compose",
    "compose.yml",
    "compose.yaml",
    "kubernetes",
    "k8s",
    "helm",
    "terraform",
    "deploy",
    "ansible",
    ".github/workflows",
    ".gitlab-ci",
    "jenkinsfile",
    "procfile",
    "vercel.json",
    "netlify.toml",
    "serverless",
    "cloudbuild",
    "skaffold",
    "nginx",
];

pub const CONFIG_KEYWORDS: &[&str] = &["config", "settings", ".properties", ".env"];

/// Extensions of structured configuration formats.
pub const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "xml", "ini", "conf"];

/// Marker that raises a config file to high priority.
pub const ENV_FILE_MARKER: &str = ".env";

/// Directory names holding vendored third-party code.
pub const VENDORED_DIRS: &[&str] = &["node_modules", "vendor", "bower_components"];

/// Directory names holding build or distribution output.
pub const OUTPUT_DIRS: &[&str] = &["build", "target", "out", "dist"];

/// A path split into the pieces the rules look at. All fields are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    /// Lowercased path with `/` separators and no leading `./` or `/`.
    pub normalized: String,
    /// Final path segment.
    pub file_name: String,
    /// Text after the last dot of the file name, if the name is not a dotfile.
    pub extension: Option<String>,
    /// Every segment except the file name.
    pub dirs: Vec<String>,
}

impl PathParts {
    /// Returns `None` for empty or separator-only input.
    pub fn parse(path: &str) -> Option<Self> {
        let lowered = path.trim().to_lowercase().replace('\\', "/");
        let mut normalized = lowered.as_str();
        while let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest;
        }
        let normalized = normalized.trim_matches('/').to_string();

        let mut segments: Vec<String> = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        let file_name = segments.pop()?;

        let extension = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_string()),
            _ => None,
        };

        Some(Self {
            normalized,
            file_name,
            extension,
            dirs: segments,
        })
    }

    pub fn is_at_root(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn in_vendored_dir(&self) -> bool {
        self.dirs.iter().any(|d| VENDORED_DIRS.contains(&d.as_str()))
    }

    pub fn in_output_dir(&self) -> bool {
        self.dirs.iter().any(|d| OUTPUT_DIRS.contains(&d.as_str()))
    }

    fn is_dependency_manifest(&self) -> bool {
        DEPENDENCY_FILES.contains(&self.file_name.as_str())
    }
}

/// One entry of the precedence table.
pub struct Rule {
    pub category: Category,
    /// Returns the match reason, or `None` when the rule does not apply.
    pub matches: fn(&PathParts) -> Option<String>,
}

/// The classification table, in precedence order.
pub const RULES: [Rule; 5] = [
    Rule {
        category: Category::Secret,
        matches: match_secret,
    },
    Rule {
        category: Category::Dependency,
        matches: match_dependency,
    },
    Rule {
        category: Category::Security,
        matches: match_security,
    },
    Rule {
        category: Category::Deployment,
        matches: match_deployment,
    },
    Rule {
        category: Category::Config,
        matches: match_config,
    },
];

pub fn match_secret(parts: &PathParts) -> Option<String> {
    if SECRET_FILES.contains(&parts.file_name.as_str()) {
        return Some(format!(
            "matches known secret file name '{}'",
            parts.file_name
        ));
    }

    if let Some(prefix) = SECRET_FILE_PREFIXES
        .iter()
        .find(|prefix| parts.file_name.starts_with(*prefix))
    {
        return Some(format!("file name starts with secret prefix '{}'", prefix));
    }

    if parts.in_vendored_dir() {
        return None;
    }

    find_keyword(&parts.normalized, SECRET_KEYWORDS)
        .map(|keyword| format!("path contains secret keyword '{}'", keyword))
}

pub fn match_dependency(parts: &PathParts) -> Option<String> {
    if parts.is_dependency_manifest() {
        Some(format!("dependency manifest '{}'", parts.file_name))
    } else {
        None
    }
}

pub fn match_security(parts: &PathParts) -> Option<String> {
    if parts.in_vendored_dir() || parts.in_output_dir() {
        return None;
    }
    find_keyword(&parts.normalized, SECURITY_KEYWORDS)
        .map(|keyword| format!("path contains security keyword '{}'", keyword))
}

pub fn match_deployment(parts: &PathParts) -> Option<String> {
    if parts.in_vendored_dir() || parts.in_output_dir() {
        return None;
    }
    find_keyword(&parts.normalized, DEPLOYMENT_KEYWORDS)
        .map(|keyword| format!("path contains deployment keyword '{}'", keyword))
}

pub fn match_config(parts: &PathParts) -> Option<String> {
    if let Some(keyword) = find_keyword(&parts.normalized, CONFIG_KEYWORDS) {
        return Some(format!("path contains config keyword '{}'", keyword));
    }

    // Build-tool manifests share these extensions (pom.xml, pnpm-lock.yaml).
    if parts.is_dependency_manifest() {
        return None;
    }

    parts
        .extension
        .as_deref()
        .filter(|ext| CONFIG_EXTENSIONS.contains(ext))
        .map(|ext| format!("structured config extension '.{}'", ext))
}

fn find_keyword(haystack: &str, keywords: &[&'static str]) -> Option<&'static str> {
    keywords.iter().copied().find(|k| haystack.contains(k))
}
