//! URL validation, absolute/relative rewriting, and anti-spam checks.
//!
//! Used for every URL-bearing attribute and for `url()` references inside
//! `style` values. Disallowed schemes are not removed: the whole URL is
//! prefixed with a literal marker so it renders as inert text.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::{Config, UrlForm};

/// Prefix rendering a scheme-rejected URL inert.
pub const DENIED_PREFIX: &str = "denied:";

/// Leading scheme token up to the first `:`.
#[allow(clippy::expect_used)]
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*):").expect("SCHEME_RE regex"));

/// Outcome of validating one URL value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlVerdict {
    /// Keep the (possibly rewritten) value.
    Keep(String),
    /// Keep the value and add `rel="nofollow"` to the element.
    KeepFlagged(String),
    /// Drop the whole attribute.
    Drop,
}

/// Validate a URL in the given context (attribute name, or `"style"` for
/// CSS `url()` references) and apply rewriting and anti-spam rules.
#[must_use]
pub fn check_url(value: &str, context: &str, config: &Config) -> UrlVerdict {
    let value = value.trim();

    // Already neutralized on a previous pass; never stack prefixes.
    if value.starts_with(DENIED_PREFIX) {
        return UrlVerdict::Keep(value.to_string());
    }

    let scheme = extract_scheme(value);

    let wildcard = config
        .schemes_for(context)
        .is_some_and(|set| set.contains("*"));

    if !wildcard {
        if let Some(scheme) = &scheme {
            let allowed = config
                .schemes_for(context)
                .is_some_and(|set| set.contains(scheme.as_str()));
            if !allowed {
                return UrlVerdict::Keep(format!("{DENIED_PREFIX}{value}"));
            }
        }
    }

    let rewritten = rewrite(value, scheme.as_deref(), config);

    if scheme.as_deref() == Some("mailto") {
        if config.obfuscate_mailto {
            return UrlVerdict::Keep(rewritten.replace('@', "&#64;"));
        }
        return UrlVerdict::Keep(rewritten);
    }

    if let Some(must_match) = &config.spam_allow {
        if !must_match.is_match(&rewritten) {
            return UrlVerdict::Drop;
        }
    }
    if let Some(flag) = &config.spam_flag {
        if flag.is_match(&rewritten) {
            return UrlVerdict::KeepFlagged(rewritten);
        }
    }

    UrlVerdict::Keep(rewritten)
}

/// Extract a scheme-like prefix. Whitespace is removed before sniffing so
/// `jav\tascript:` style obfuscation cannot smuggle a scheme past the
/// check; relative, fragment, and query references yield `None`.
fn extract_scheme(value: &str) -> Option<String> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    SCHEME_RE
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Rewrite between absolute and relative form against the configured base.
fn rewrite(value: &str, scheme: Option<&str>, config: &Config) -> String {
    let (Some(base), Some(form)) = (&config.base_url, config.url_form) else {
        return value.to_string();
    };
    match form {
        UrlForm::Absolute => {
            if scheme.is_some() || value.is_empty() || value.starts_with('#') {
                return value.to_string();
            }
            match base.join(value) {
                Ok(resolved) => resolved.to_string(),
                Err(_) => value.to_string(),
            }
        }
        UrlForm::Relative => {
            if !matches!(scheme, Some("http" | "https")) {
                return value.to_string();
            }
            match Url::parse(value) {
                Ok(parsed) => base.make_relative(&parsed).unwrap_or_else(|| value.to_string()),
                Err(_) => value.to_string(),
            }
        }
    }
}

/// Matches `url(...)` references inside a style value.
#[allow(clippy::expect_used)]
static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*['"]?([^'")]*)['"]?\s*\)"#).expect("CSS_URL_RE regex")
});

/// Validate every `url()` reference inside a style value, rewriting each in
/// place. Returns `None` when any reference must be dropped, which drops
/// the whole style attribute.
#[must_use]
pub fn check_style_urls(style: &str, config: &Config) -> Option<String> {
    let mut dropped = false;
    let replaced = CSS_URL_RE.replace_all(style, |caps: &regex::Captures| {
        match check_url(&caps[1], "style", config) {
            UrlVerdict::Keep(url) | UrlVerdict::KeepFlagged(url) => format!("url({url})"),
            UrlVerdict::Drop => {
                dropped = true;
                String::new()
            }
        }
    });
    if dropped {
        None
    } else {
        Some(replaced.into_owned())
    }
}

/// Validate each candidate of a `srcset` value. Candidates are
/// comma-separated `URL [descriptor]` pairs; a denied candidate poisons the
/// whole attribute.
#[must_use]
pub fn check_srcset(value: &str, config: &Config) -> UrlVerdict {
    let mut flagged = false;
    let mut candidates = Vec::new();
    for candidate in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let (url, descriptor) = match candidate.split_once(char::is_whitespace) {
            Some((url, desc)) => (url, Some(desc.trim())),
            None => (candidate, None),
        };
        let checked = match check_url(url, "src", config) {
            UrlVerdict::Keep(url) => url,
            UrlVerdict::KeepFlagged(url) => {
                flagged = true;
                url
            }
            UrlVerdict::Drop => return UrlVerdict::Drop,
        };
        if checked.starts_with(DENIED_PREFIX) {
            return UrlVerdict::Drop;
        }
        match descriptor {
            Some(desc) => candidates.push(format!("{checked} {desc}")),
            None => candidates.push(checked),
        }
    }
    let joined = candidates.join(", ");
    if flagged {
        UrlVerdict::KeepFlagged(joined)
    } else {
        UrlVerdict::Keep(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[allow(clippy::expect_used)]
    fn base(url: &str) -> Url {
        Url::parse(url).expect("valid base url")
    }

    #[test]
    fn relative_urls_pass() {
        let config = Config::default();
        assert_eq!(
            check_url("/about", "href", &config),
            UrlVerdict::Keep("/about".into())
        );
        assert_eq!(
            check_url("#top", "href", &config),
            UrlVerdict::Keep("#top".into())
        );
        assert_eq!(
            check_url("?page=2", "href", &config),
            UrlVerdict::Keep("?page=2".into())
        );
    }

    #[test]
    fn disallowed_scheme_gets_denied_prefix() {
        let config = Config::default();
        assert_eq!(
            check_url("javascript:evil()", "href", &config),
            UrlVerdict::Keep("denied:javascript:evil()".into())
        );
        assert_eq!(
            check_url("vbscript:x", "src", &config),
            UrlVerdict::Keep("denied:vbscript:x".into())
        );
    }

    #[test]
    fn denied_prefix_never_stacks() {
        let config = Config::default();
        assert_eq!(
            check_url("denied:javascript:evil()", "href", &config),
            UrlVerdict::Keep("denied:javascript:evil()".into())
        );
    }

    #[test]
    fn scheme_with_embedded_whitespace_is_still_caught() {
        let config = Config::default();
        assert_eq!(
            check_url("java\tscript:alert(1)", "href", &config),
            UrlVerdict::Keep("denied:java\tscript:alert(1)".into())
        );
    }

    #[test]
    fn scheme_case_is_insensitive() {
        let config = Config::default();
        assert_eq!(
            check_url("JAVASCRIPT:x", "href", &config),
            UrlVerdict::Keep("denied:JAVASCRIPT:x".into())
        );
        assert_eq!(
            check_url("HTTPS://ok.example/", "href", &config),
            UrlVerdict::Keep("HTTPS://ok.example/".into())
        );
    }

    #[test]
    fn wildcard_context_accepts_anything() {
        let mut config = Config::default();
        config
            .schemes
            .insert("href".into(), ["*".to_string()].into_iter().collect());
        assert_eq!(
            check_url("gopher:x", "href", &config),
            UrlVerdict::Keep("gopher:x".into())
        );
    }

    #[test]
    fn rewrite_to_absolute() {
        let config = Config {
            base_url: Some(base("https://example.com/dir/")),
            url_form: Some(UrlForm::Absolute),
            ..Config::default()
        };
        assert_eq!(
            check_url("../up/page", "href", &config),
            UrlVerdict::Keep("https://example.com/up/page".into())
        );
        assert_eq!(
            check_url("#frag", "href", &config),
            UrlVerdict::Keep("#frag".into())
        );
    }

    #[test]
    fn rewrite_to_relative_same_origin_only() {
        let config = Config {
            base_url: Some(base("https://example.com/dir/page")),
            url_form: Some(UrlForm::Relative),
            ..Config::default()
        };
        assert_eq!(
            check_url("https://example.com/dir/other", "href", &config),
            UrlVerdict::Keep("other".into())
        );
        // Cross-origin URLs are left alone.
        assert_eq!(
            check_url("https://elsewhere.net/x", "href", &config),
            UrlVerdict::Keep("https://elsewhere.net/x".into())
        );
    }

    #[test]
    fn mailto_obfuscation() {
        let config = Config {
            obfuscate_mailto: true,
            ..Config::default()
        };
        assert_eq!(
            check_url("mailto:bob@example.com", "href", &config),
            UrlVerdict::Keep("mailto:bob&#64;example.com".into())
        );
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn spam_allow_drops_nonmatching() {
        let config = Config {
            spam_allow: Some(Regex::new(r"^https://good\.example/").expect("re")),
            ..Config::default()
        };
        assert_eq!(
            check_url("https://good.example/page", "href", &config),
            UrlVerdict::Keep("https://good.example/page".into())
        );
        assert_eq!(check_url("https://bad.example/", "href", &config), UrlVerdict::Drop);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn spam_flag_requests_nofollow() {
        let config = Config {
            spam_flag: Some(Regex::new(r"sketchy").expect("re")),
            ..Config::default()
        };
        assert_eq!(
            check_url("https://sketchy.example/", "href", &config),
            UrlVerdict::KeepFlagged("https://sketchy.example/".into())
        );
    }

    #[test]
    fn style_urls_validated_in_place() {
        let config = Config::default();
        assert_eq!(
            check_style_urls("background: url('https://x.example/a.png')", &config),
            Some("background: url(https://x.example/a.png)".into())
        );
        let denied = check_style_urls("background: url(javascript:x)", &config);
        assert_eq!(
            denied,
            Some("background: url(denied:javascript:x)".into())
        );
    }

    #[test]
    fn srcset_candidates_checked_individually() {
        let config = Config::default();
        assert_eq!(
            check_srcset("a.png 1x, b.png 2x", &config),
            UrlVerdict::Keep("a.png 1x, b.png 2x".into())
        );
        assert_eq!(
            check_srcset("a.png 1x, javascript:x 2x", &config),
            UrlVerdict::Drop
        );
    }
}
