//! Route lookup and target construction.
//!
//! # Responsibilities
//! - Store compiled rules in declared order
//! - Look up the first rule whose prefix matches the request path
//! - Resolve the upstream URL for a match
//! - Compute the redirect location for raw mode
//!
//! # Design Decisions
//! - Immutable after construction (shared via `ArcSwap`, swapped on reload)
//! - First match wins in declared order; no longest-prefix search
//! - Explicit no-match (`None`) rather than a silent default

use url::form_urlencoded;
use url::Url;

use crate::config::schema::ProxyRule;
use crate::routing::matcher::{sanitize_path, PrefixRule, RouteError};

/// Query parameter that switches a request into redirect mode.
pub const RAW_PARAM: &str = "raw";

/// Placeholder substituted in redirect templates.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Ordered rule table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Vec<PrefixRule>,
}

/// A rule selected for a request, with its sanitized residual path.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub rule: &'a PrefixRule,
    pub relative: String,
}

impl Router {
    /// Compile all configured rules, failing on the first invalid one.
    pub fn from_config(rules: &[ProxyRule]) -> Result<Self, RouteError> {
        let rules = rules
            .iter()
            .map(PrefixRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Find the first rule whose prefix is a literal prefix of `path`.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.rules.iter().find_map(|rule| {
            rule.strip(path).map(|residual| RouteMatch {
                rule,
                relative: sanitize_path(residual),
            })
        })
    }

    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RouteMatch<'_> {
    /// Resolve the sanitized residual against the rule's target.
    pub fn target_url(&self) -> Result<Url, url::ParseError> {
        self.rule.target().join(&self.relative)
    }

    /// Upstream URL with every inbound query pair appended after the
    /// target's own query.
    pub fn upstream_url(&self, query: &[(String, String)]) -> Result<Url, url::ParseError> {
        let mut url = self.target_url()?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Location for raw mode: the rule's template (or the resolved target),
    /// with every query pair except `raw` re-appended.
    pub fn redirect_location(&self, query: &[(String, String)]) -> Result<String, url::ParseError> {
        let mut location = match self.rule.raw_redirect() {
            Some(template) => template.replacen(PATH_PLACEHOLDER, &self.relative, 1),
            None => self.target_url()?.to_string(),
        };

        let forwarded: Vec<_> = query.iter().filter(|(k, _)| k != RAW_PARAM).collect();
        if !forwarded.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(forwarded)
                .finish();
            location.push(if location.contains('?') { '&' } else { '?' });
            location.push_str(&encoded);
        }
        Ok(location)
    }
}

/// Decode a raw query string into ordered pairs, keeping duplicates.
pub fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// Whether the first `raw` parameter is exactly `"true"`.
pub fn is_raw_request(query: &[(String, String)]) -> bool {
    query
        .iter()
        .find(|(k, _)| k == RAW_PARAM)
        .is_some_and(|(_, v)| v == "true")
}
