//! Resolved sanitization configuration.
//!
//! `Config` is the fully resolved flag/map set consumed by a sanitization
//! call. All fields are public for easy construction; use
//! `Default::default()` for the safe defaults. A configuration is immutable
//! for the duration of a call — only the id registry mutates.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use url::Url;

use crate::catalog;

/// How character references are re-encoded by the entity normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityMode {
    /// Keep known named references as names.
    #[default]
    Named,
    /// Force decimal numeric references.
    Decimal,
    /// Force hexadecimal numeric references.
    Hex,
}

/// Handling of comment and CDATA sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionPolicy {
    /// Remove the section entirely.
    #[default]
    Strip,
    /// HTML-escape the body and emit it as visible text.
    Encode,
    /// Keep the section, shielded from the tag parser.
    Pass,
}

/// What happens to markup that fails element validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidMarkup {
    /// Drop the tag, keep surrounding text.
    #[default]
    Discard,
    /// Drop the tag and the content up to its matching close.
    DiscardWithContent,
    /// Render the tag as escaped visible text.
    Escape,
}

/// Preferred form for URLs resolvable against `base_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlForm {
    /// Rewrite same-origin relative URLs to absolute.
    Absolute,
    /// Rewrite same-origin absolute URLs to relative.
    Relative,
}

/// Duplicate-id enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// No enforcement.
    #[default]
    Off,
    /// Drop an `id` attribute whose value is already reserved.
    Drop,
    /// Suffix a colliding `id` with a counter until unique.
    Rename,
}

/// Mirroring of `lang` into `xml:lang`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlLang {
    /// Leave `lang` alone.
    #[default]
    Off,
    /// Add an `xml:lang` copy, keep `lang`.
    Mirror,
    /// Add an `xml:lang` copy and remove `lang`.
    Replace,
}

/// Allowed element set with wildcard add/remove resolution.
///
/// Parsed from tokens such as `"* -iframe +my-widget"`: `*` admits every
/// catalog element, `-name` removes, `+name` (or a bare name without a
/// leading `*`) adds. Explicit adds also admit names the catalog does not
/// know.
#[derive(Debug, Clone)]
pub struct ElementPolicy {
    base_all: bool,
    added: HashSet<String>,
    removed: HashSet<String>,
}

impl ElementPolicy {
    /// Parse the wildcard syntax. Never fails; unknown tokens are adds.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut policy = Self {
            base_all: false,
            added: HashSet::new(),
            removed: HashSet::new(),
        };
        for token in text.split([' ', ',']).filter(|t| !t.is_empty()) {
            if token == "*" {
                policy.base_all = true;
            } else if let Some(name) = token.strip_prefix('-') {
                policy.removed.insert(name.to_ascii_lowercase());
            } else {
                let name = token.strip_prefix('+').unwrap_or(token);
                policy.added.insert(name.to_ascii_lowercase());
            }
        }
        policy
    }

    /// Check whether `name` is in the allowed element set.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        if self.removed.contains(name) {
            return false;
        }
        self.added.contains(name) || (self.base_all && catalog::is_known(name))
    }

    /// Check whether `name` was explicitly added (admits uncataloged names).
    #[must_use]
    pub fn explicitly_added(&self, name: &str) -> bool {
        self.added.contains(name)
    }

    /// Check whether `name` was explicitly removed.
    #[must_use]
    pub fn removes(&self, name: &str) -> bool {
        self.removed.contains(name)
    }
}

impl Default for ElementPolicy {
    /// Safe default: every catalog element except embedded-content vectors.
    fn default() -> Self {
        Self::parse("* -embed -iframe -object")
    }
}

/// Denied attribute names, with wildcard deny-all plus exceptions.
///
/// `"onclick onmouseover"` denies the listed names; `"* -title -href"`
/// denies everything except the `-`-prefixed names.
#[derive(Debug, Clone, Default)]
pub struct AttributeDenyList {
    all: bool,
    names: HashSet<String>,
    except: HashSet<String>,
}

impl AttributeDenyList {
    /// Parse the wildcard syntax. Never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut list = Self::default();
        for token in text.split([' ', ',']).filter(|t| !t.is_empty()) {
            if token == "*" {
                list.all = true;
            } else if let Some(name) = token.strip_prefix('-') {
                list.except.insert(name.to_ascii_lowercase());
            } else {
                list.names.insert(token.to_ascii_lowercase());
            }
        }
        list
    }

    /// Check whether `name` is denied.
    #[must_use]
    pub fn denies(&self, name: &str) -> bool {
        if self.all {
            !self.except.contains(name)
        } else {
            self.names.contains(name)
        }
    }
}

/// Resolved sanitization configuration.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Allowed element set.
    ///
    /// Default: all catalog elements except `embed`, `iframe`, `object`.
    pub elements: ElementPolicy,

    /// Denied attribute names (wildcard with exceptions).
    ///
    /// Default: deny none. Attributes still have to be recognized by the
    /// catalog or permitted by the specification to survive.
    pub deny_attributes: AttributeDenyList,

    /// Allowed URL schemes per context: keyed by attribute name, `"*"` for
    /// the fallback, `"style"` for CSS `url()` references. A `"*"` entry in
    /// a scheme set admits every scheme for that context.
    ///
    /// Default: `href` → ftp/http/https/mailto/news/tel, `style` →
    /// http/https, `*` → http/https.
    pub schemes: HashMap<String, HashSet<String>>,

    /// Entity re-encoding mode.
    ///
    /// Default: `EntityMode::Named`
    pub entity_mode: EntityMode,

    /// Comment handling.
    ///
    /// Default: `SectionPolicy::Strip`
    pub comments: SectionPolicy,

    /// CDATA-section handling.
    ///
    /// Default: `SectionPolicy::Strip`
    pub cdata: SectionPolicy,

    /// Policy for markup that fails validation.
    ///
    /// Default: `InvalidMarkup::Discard`
    pub invalid_markup: InvalidMarkup,

    /// Run the tag balancer. Disabling emits validated tags in input order
    /// without nesting repair.
    ///
    /// Default: `true`
    pub balance: bool,

    /// Element assumed to contain the fragment; decides which elements are
    /// valid at the top level and whether bare text is legal there.
    ///
    /// Default: `"div"`
    pub parent: String,

    /// Admit hyphenated custom-element names matching the legal character
    /// class. Custom elements nest anywhere.
    ///
    /// Default: `false`
    pub custom_elements: bool,

    /// Duplicate-id enforcement; reserved ids are recorded in the registry
    /// for the lifetime the caller chooses.
    ///
    /// Default: `IdPolicy::Off`
    pub unique_ids: IdPolicy,

    /// Anti-spam: URLs (other than `mailto:`) must match this pattern or
    /// the whole attribute is silently dropped.
    ///
    /// Default: `None`
    pub spam_allow: Option<Regex>,

    /// Anti-spam: URLs matching this pattern get `rel="nofollow"` added to
    /// their element without being dropped.
    ///
    /// Default: `None`
    pub spam_flag: Option<Regex>,

    /// Obfuscate `@` in `mailto:` URLs as `&#64;`.
    ///
    /// Default: `false`
    pub obfuscate_mailto: bool,

    /// Base URL for absolute/relative rewriting. No rewriting when `None`.
    ///
    /// Default: `None`
    pub base_url: Option<Url>,

    /// Preferred URL form for same-origin URLs (needs `base_url`).
    ///
    /// Default: `None`
    pub url_form: Option<UrlForm>,

    /// Rewrite deprecated elements and presentational attributes to modern
    /// equivalents with style declarations.
    ///
    /// Default: `true`
    pub translate_deprecated: bool,

    /// Lowercase the values of enumerated attributes.
    ///
    /// Default: `true`
    pub lowercase_enums: bool,

    /// `lang` → `xml:lang` mirroring.
    ///
    /// Default: `XmlLang::Off`
    pub xml_lang: XmlLang,

    /// Serialize void elements with a trailing slash (`<br />`).
    ///
    /// Default: `false`
    pub void_slash: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut schemes: HashMap<String, HashSet<String>> = HashMap::new();
        schemes.insert(
            "href".to_string(),
            ["ftp", "http", "https", "mailto", "news", "tel"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        schemes.insert(
            "style".to_string(),
            ["http", "https"].into_iter().map(String::from).collect(),
        );
        schemes.insert(
            "*".to_string(),
            ["http", "https"].into_iter().map(String::from).collect(),
        );

        Self {
            elements: ElementPolicy::default(),
            deny_attributes: AttributeDenyList::default(),
            schemes,
            entity_mode: EntityMode::Named,
            comments: SectionPolicy::Strip,
            cdata: SectionPolicy::Strip,
            invalid_markup: InvalidMarkup::Discard,
            balance: true,
            parent: "div".to_string(),
            custom_elements: false,
            unique_ids: IdPolicy::Off,
            spam_allow: None,
            spam_flag: None,
            obfuscate_mailto: false,
            base_url: None,
            url_form: None,
            translate_deprecated: true,
            lowercase_enums: true,
            xml_lang: XmlLang::Off,
            void_slash: false,
        }
    }
}

impl Config {
    /// Scheme allow-list for a URL context, falling back to `"*"`.
    #[must_use]
    pub fn schemes_for(&self, context: &str) -> Option<&HashSet<String>> {
        self.schemes.get(context).or_else(|| self.schemes.get("*"))
    }
}
