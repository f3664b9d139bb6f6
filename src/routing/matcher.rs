//! Rule matching and residual path handling.
//!
//! # Responsibilities
//! - Compile a configured rule (parse its target URL once)
//! - Match the request path by literal prefix (case-sensitive)
//! - Sanitize the residual path left after the prefix
//!
//! # Design Decisions
//! - No regex: prefix comparison and a single pass over the residual
//! - Target URLs are validated at compile time, not per request

use url::Url;

use crate::config::schema::ProxyRule;

/// Errors raised while compiling rules.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("rule prefix must not be empty")]
    EmptyPrefix,

    #[error("rule {prefix:?} has invalid target {target:?}: {source}")]
    InvalidTarget {
        prefix: String,
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("rule {prefix:?} target {target:?} cannot be used as a base URL")]
    NotABase { prefix: String, target: String },
}

/// A compiled forwarding rule.
#[derive(Debug, Clone)]
pub struct PrefixRule {
    prefix: String,
    target: Url,
    raw_redirect: Option<String>,
}

impl PrefixRule {
    /// Compile a configured rule.
    pub fn compile(rule: &ProxyRule) -> Result<Self, RouteError> {
        if rule.prefix.is_empty() {
            return Err(RouteError::EmptyPrefix);
        }
        let target = Url::parse(&rule.target).map_err(|source| RouteError::InvalidTarget {
            prefix: rule.prefix.clone(),
            target: rule.target.clone(),
            source,
        })?;
        if target.cannot_be_a_base() {
            return Err(RouteError::NotABase {
                prefix: rule.prefix.clone(),
                target: rule.target.clone(),
            });
        }

        Ok(Self {
            prefix: rule.prefix.clone(),
            target,
            raw_redirect: rule.raw_redirect.clone(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn raw_redirect(&self) -> Option<&str> {
        self.raw_redirect.as_deref()
    }

    /// The residual path if `path` starts with this rule's prefix.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }
}

/// Canonicalize the residual path: drop leading `/`, remove every `|`,
/// and collapse runs of `/` into one.
pub fn sanitize_path(residual: &str) -> String {
    let mut out = String::with_capacity(residual.len());
    for c in residual.trim_start_matches('/').chars() {
        match c {
            '|' => {}
            '/' if out.ends_with('/') => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("//a/|b///c"), "a/b/c");
        assert_eq!(sanitize_path("/photo.png"), "photo.png");
        assert_eq!(sanitize_path(""), "");
        assert_eq!(sanitize_path("///"), "");
        assert_eq!(sanitize_path("a/b/"), "a/b/");
        assert_eq!(sanitize_path("||a||"), "a");
    }

    #[test]
    fn test_sanitize_removes_pipes_before_collapsing() {
        // The pipe between slashes vanishes, leaving one run of slashes
        assert_eq!(sanitize_path("a/|/b"), "a/b");
        // Leading slashes are trimmed before the pipe is dropped
        assert_eq!(sanitize_path("/|/a"), "/a");
    }

    #[test]
    fn test_prefix_strip() {
        let rule = PrefixRule::compile(&ProxyRule::new("/img", "https://origin.example/")).unwrap();
        assert_eq!(rule.strip("/img/photo.png"), Some("/photo.png"));
        assert_eq!(rule.strip("/imgs/photo.png"), Some("s/photo.png"));
        assert_eq!(rule.strip("/IMG/photo.png"), None); // Case sensitive
        assert_eq!(rule.strip("/other"), None);
    }

    #[test]
    fn test_compile_rejects_bad_rules() {
        assert!(matches!(
            PrefixRule::compile(&ProxyRule::new("", "https://origin.example/")),
            Err(RouteError::EmptyPrefix)
        ));
        assert!(matches!(
            PrefixRule::compile(&ProxyRule::new("/a", "origin.example")),
            Err(RouteError::InvalidTarget { .. })
        ));
        assert!(matches!(
            PrefixRule::compile(&ProxyRule::new("/a", "mailto:someone@example.com")),
            Err(RouteError::NotABase { .. })
        ));
    }
}
