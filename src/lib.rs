//! # scour
//!
//! Streaming HTML sanitization and normalization engine.
//!
//! Given untrusted markup plus a [`Config`] and a [`Specification`], the
//! engine produces markup that contains only permitted elements and
//! attributes, has valid element nesting, carries no unsafe URLs, scripts,
//! or malformed entities, and is well-formed: every tag closed, no dangling
//! open elements.
//!
//! ## Quick Start
//!
//! ```rust
//! use scour::{sanitize, Config, Specification};
//!
//! let config = Config::default();
//! let spec = Specification::default();
//!
//! let out = sanitize("<p>Hello <b>World</i></p>", &config, &spec);
//! assert_eq!(out, "<p>Hello <b>World</b></p>");
//!
//! let out = sanitize(r#"<a href="javascript:evil()">x</a>"#, &config, &spec);
//! assert_eq!(out, r#"<a href="denied:javascript:evil()">x</a>"#);
//! ```
//!
//! ## Design
//!
//! - **Total**: every input has a defined, safe output. Malformed tags,
//!   unknown entities, disallowed attributes, and unsafe URLs are
//!   neutralized (dropped, escaped, or substituted), never surfaced as
//!   errors.
//! - **Table-driven**: element categories, content models, and the nesting
//!   override tables are constant maps in [`catalog`], so one generic
//!   balancing algorithm enforces dozens of special-cased rules.
//! - **Streaming**: a bespoke tokenizer and an explicit open-element stack,
//!   no DOM construction.

mod error;

/// Resolved configuration and the wildcard element/attribute policies.
pub mod config;

/// Element classification tables driving validation and balancing.
pub mod catalog;

/// Entity normalization and the builtin named-reference table.
pub mod entities;

/// Comment/CDATA shielding and the unshield finalizer.
pub mod shield;

/// Attribute-rule specification and its parsers.
pub mod spec;

/// Id-uniqueness registries.
pub mod registry;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Tokenizer, attribute validator, URL checks, and the tag balancer.
pub mod sanitizer;

// Public API - re-exports
pub use config::{
    AttributeDenyList, Config, ElementPolicy, EntityMode, IdPolicy, InvalidMarkup,
    SectionPolicy, UrlForm, XmlLang,
};
pub use error::{Error, Result};
pub use registry::{reset_global_ids, CallRegistry, IdRegistry, SharedRegistry};
pub use spec::{AttrRules, Specification};

/// Sanitize untrusted markup.
///
/// Pure apart from the process-wide id registry, which is only touched when
/// `config.unique_ids` is enabled. Use [`sanitize_with_registry`] to inject
/// a registry with a different lifetime.
///
/// # Example
///
/// ```rust
/// use scour::{sanitize, Config, Specification};
///
/// let out = sanitize(
///     "<script>alert(1)</script><p>kept</p>",
///     &Config::default(),
///     &Specification::default(),
/// );
/// assert_eq!(out, "<p>kept</p>");
/// ```
#[must_use]
pub fn sanitize(input: &str, config: &Config, spec: &Specification) -> String {
    let mut registry = SharedRegistry;
    sanitizer::run(input, config, spec, &mut registry)
}

/// Sanitize with a caller-supplied id registry.
///
/// The registry decides the lifetime of id-uniqueness: a fresh
/// [`CallRegistry`] scopes it to one call, a shared registry extends it
/// across a session.
///
/// # Example
///
/// ```rust
/// use scour::{sanitize_with_registry, CallRegistry, Config, IdPolicy, Specification};
///
/// let config = Config { unique_ids: IdPolicy::Drop, ..Config::default() };
/// let mut registry = CallRegistry::default();
/// let out = sanitize_with_registry(
///     r#"<p id="a">x</p><p id="a">y</p>"#,
///     &config,
///     &Specification::default(),
///     &mut registry,
/// );
/// assert_eq!(out, r#"<p id="a">x</p><p>y</p>"#);
/// ```
#[must_use]
pub fn sanitize_with_registry(
    input: &str,
    config: &Config,
    spec: &Specification,
    registry: &mut dyn IdRegistry,
) -> String {
    sanitizer::run(input, config, spec, registry)
}

/// Sanitize raw bytes with automatic encoding detection.
///
/// Detects the charset from meta tags, transcodes to UTF-8 (lossily, so
/// invalid sequences become replacement characters rather than errors), and
/// sanitizes the result.
///
/// # Example
///
/// ```rust
/// use scour::{sanitize_bytes, Config, Specification};
///
/// let html = b"<meta charset=\"ISO-8859-1\"><p>Caf\xE9</p>";
/// let out = sanitize_bytes(html, &Config::default(), &Specification::default());
/// assert_eq!(out, "<p>Caf\u{e9}</p>");
/// ```
#[must_use]
pub fn sanitize_bytes(input: &[u8], config: &Config, spec: &Specification) -> String {
    let text = encoding::transcode_to_utf8(input);
    sanitize(&text, config, spec)
}
