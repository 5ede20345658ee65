use std::fs;
use std::path::Path;

use anyhow::Context;

/// Candidate-word source: a file (one word per line, `#` comments and
/// blanks skipped) or the built-in default list.
pub struct Wordlist {
    words: Vec<String>,
}

impl Wordlist {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read wordlist {}", path.display()))?;
        let words = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Ok(Self { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Wordlist {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Built-in prefixes: the plumbing every organisation exposes, plus the
/// dev/staging and API naming conventions that most often leak.
const DEFAULT_WORDS: &[&str] = &[
    "www", "mail", "ftp", "webmail", "smtp", "pop", "pop3", "imap", "ns", "ns1", "ns2", "ns3",
    "mx", "mx1", "autodiscover", "autoconfig", "cpanel", "whm", "webdisk", "vpn", "remote",
    "gateway", "proxy", "firewall", "admin", "administrator", "portal", "console", "dashboard",
    "intranet", "internal", "private", "secure", "sso", "auth", "login", "id", "api", "api1",
    "api2", "api-dev", "api-staging", "rest", "graphql", "ws", "app", "apps", "mobile", "m",
    "web", "www1", "www2", "blog", "news", "forum", "wiki", "docs", "documentation", "help",
    "support", "status", "health", "shop", "store", "pay", "payments", "billing", "dev",
    "develop", "development", "test", "testing", "qa", "uat", "stage", "staging", "preprod",
    "pre-prod", "sandbox", "demo", "beta", "alpha", "canary", "preview", "old", "legacy",
    "backup", "archive", "db", "database", "mysql", "postgres", "redis", "cache", "search",
    "elastic", "elasticsearch", "kibana", "grafana", "prometheus", "monitor", "monitoring",
    "metrics", "logs", "logging", "jenkins", "ci", "cd", "build", "git", "gitlab", "svn",
    "repo", "registry", "docker", "k8s", "cloud", "s3", "storage", "static", "assets", "cdn",
    "img", "images", "media", "files", "upload", "uploads", "download", "downloads", "video",
    "chat", "meet", "calendar", "crm", "erp", "hr", "jira", "confluence", "v1", "v2", "v3",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn default_list_is_nonempty_and_has_the_basics() {
        let wl = Wordlist::default();
        assert!(wl.len() > 100);
        assert!(wl.words().contains(&"www".to_string()));
        assert!(wl.words().contains(&"api".to_string()));
    }

    #[test]
    fn file_loading_skips_comments_and_blanks() {
        let path = env::temp_dir().join("subscout_wordlist_test.txt");
        fs::write(&path, "www\n# a comment\n\n  api  \nstaging\n").unwrap();
        let wl = Wordlist::from_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(wl.words(), &["www", "api", "staging"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Wordlist::from_file(Path::new("/nonexistent/words.txt")).is_err());
    }
}
