//! Attribute parsing and validation.
//!
//! Parsing is an explicit three-state machine over the tag's attribute
//! text; it never aborts, skipping malformed runs to the next safe
//! boundary. Validation checks each parsed attribute against the catalog,
//! the configuration's deny list, and the specification's rule sets, then
//! applies the rewrites (deprecated presentational attributes, URL checks,
//! boolean normalization, id uniqueness, required-attribute synthesis).

use crate::catalog;
use crate::config::{Config, IdPolicy, XmlLang};
use crate::registry::IdRegistry;
use crate::sanitizer::urls::{self, UrlVerdict};
use crate::spec::Specification;

/// Attribute-parser state.
enum State {
    /// Reading an attribute name.
    ExpectName,
    /// After a name: `=` leads to a value, anything else records a
    /// valueless attribute.
    ExpectEqualsOrNext,
    /// Reading a quoted or bare value.
    ExpectValue,
}

/// Parse a tag's attribute text into an ordered list of lowercased
/// name/value pairs. Duplicate names keep the last value seen.
#[must_use]
pub fn parse_attributes(text: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut state = State::ExpectName;
    let mut name = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match state {
            State::ExpectName => {
                if c.is_whitespace() || matches!(c, '/' | '=' | '"' | '\'') {
                    // Stray separator or quote: consume and resume.
                    i += 1;
                } else {
                    let start = i;
                    while i < chars.len()
                        && !chars[i].is_whitespace()
                        && !matches!(chars[i], '=' | '/' | '"' | '\'')
                    {
                        i += 1;
                    }
                    name = chars[start..i].iter().collect::<String>().to_ascii_lowercase();
                    state = State::ExpectEqualsOrNext;
                }
            }
            State::ExpectEqualsOrNext => {
                if c.is_whitespace() {
                    i += 1;
                } else if c == '=' {
                    i += 1;
                    state = State::ExpectValue;
                } else {
                    push_attr(&mut attrs, &name, String::new());
                    state = State::ExpectName;
                }
            }
            State::ExpectValue => {
                if c.is_whitespace() {
                    i += 1;
                } else if c == '"' || c == '\'' {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && chars[end] != c {
                        end += 1;
                    }
                    let value: String = chars[start..end].iter().collect();
                    push_attr(&mut attrs, &name, escape_value(&value));
                    i = (end + 1).min(chars.len());
                    state = State::ExpectName;
                } else {
                    let start = i;
                    while i < chars.len() && !chars[i].is_whitespace() {
                        i += 1;
                    }
                    let value: String = chars[start..i].iter().collect();
                    push_attr(&mut attrs, &name, escape_value(&value));
                    state = State::ExpectName;
                }
            }
        }
    }

    // A trailing name (with or without `=`) is a valueless attribute.
    match state {
        State::ExpectEqualsOrNext | State::ExpectValue => {
            push_attr(&mut attrs, &name, String::new());
        }
        State::ExpectName => {}
    }

    attrs
}

fn escape_value(value: &str) -> String {
    value.replace('<', "&lt;")
}

fn push_attr(attrs: &mut Vec<(String, String)>, name: &str, value: String) {
    if name.is_empty() {
        return;
    }
    attrs.retain(|(existing, _)| existing != name);
    attrs.push((name.to_string(), value));
}

/// Rewrite a deprecated element to its modern equivalent, returning the
/// replacement name and a style declaration to append. `font` consumes its
/// own size/color/face attributes instead of a fixed declaration.
#[must_use]
pub fn rewrite_deprecated(name: &str, attrs: &mut Vec<(String, String)>) -> Option<(String, Option<String>)> {
    let &(replacement, decl) = catalog::DEPRECATED_ELEMENTS.get(name)?;
    if name == "font" {
        let mut decls = Vec::new();
        attrs.retain(|(attr, value)| match attr.as_str() {
            "size" => {
                if let Some(size) = font_size_style(value) {
                    decls.push(format!("font-size: {size}"));
                }
                false
            }
            "color" => {
                decls.push(format!("color: {value}"));
                false
            }
            "face" => {
                decls.push(format!("font-family: {value}"));
                false
            }
            _ => true,
        });
        let style = if decls.is_empty() { None } else { Some(decls.join("; ")) };
        return Some((replacement.to_string(), style));
    }
    Some((replacement.to_string(), decl.map(str::to_string)))
}

/// Legacy `font` size token → CSS font-size value.
fn font_size_style(value: &str) -> Option<&'static str> {
    Some(match value.trim() {
        "0" | "1" => "x-small",
        "2" => "small",
        "3" => "medium",
        "4" => "large",
        "5" => "x-large",
        "6" | "7" => "xx-large",
        "+1" | "+2" => "larger",
        "-1" | "-2" => "smaller",
        _ => return None,
    })
}

/// Presentational attribute → equivalent style declaration, or `None` when
/// the attribute is not a convertible one for this element.
fn presentational_style(element: &str, name: &str, value: &str) -> Option<String> {
    let decl = match name {
        "align" => match element {
            "img" | "input" => {
                if matches!(value, "left" | "right") {
                    format!("float: {value}")
                } else {
                    format!("vertical-align: {value}")
                }
            }
            _ => format!("text-align: {value}"),
        },
        "bgcolor" => format!("background-color: {value}"),
        "border" if matches!(element, "img" | "object") => format!("border: {value}px solid"),
        "clear" if element == "br" => {
            let side = if value.eq_ignore_ascii_case("all") { "both" } else { value };
            format!("clear: {side}")
        }
        "hspace" => format!("margin-left: {value}px; margin-right: {value}px"),
        "vspace" => format!("margin-top: {value}px; margin-bottom: {value}px"),
        "nowrap" => "white-space: nowrap".to_string(),
        "size" if element == "hr" => format!("height: {value}px"),
        "noshade" if element == "hr" => "border-style: none".to_string(),
        "compact" => "font-size: 85%".to_string(),
        "width" | "height"
            if matches!(element, "col" | "colgroup" | "hr" | "table" | "td" | "th") =>
        {
            if value.ends_with('%') {
                format!("{name}: {value}")
            } else {
                format!("{name}: {value}px")
            }
        }
        "type" if matches!(element, "li" | "ol" | "ul") => {
            let marker = match value {
                "1" => "decimal",
                "a" => "lower-alpha",
                "A" => "upper-alpha",
                "i" => "lower-roman",
                "I" => "upper-roman",
                "disc" | "circle" | "square" => value,
                _ => return None,
            };
            format!("list-style-type: {marker}")
        }
        _ => return None,
    };
    Some(decl)
}

/// Validate and rewrite the parsed attributes of one opening tag.
///
/// `extra_style` carries the declaration produced by a deprecated-element
/// rewrite; it is merged into the (possibly synthesized) style attribute.
#[must_use]
pub fn validate(
    element: &str,
    parsed: Vec<(String, String)>,
    extra_style: Option<String>,
    config: &Config,
    spec: &Specification,
    registry: &mut dyn IdRegistry,
) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    let mut styles: Vec<String> = extra_style.into_iter().collect();
    let mut nofollow = false;

    let element_attrs = catalog::ELEMENT_ATTRIBUTES.get(element);

    for (name, mut value) in parsed {
        let recognized = catalog::GLOBAL_ATTRIBUTES.contains(name.as_str())
            || element_attrs.is_some_and(|set| set.contains(name.as_str()))
            || name.starts_with("data-")
            || name.starts_with("aria-")
            || spec.permits(element, &name);
        if !recognized {
            continue;
        }
        if config.deny_attributes.denies(&name) || spec.denies(element, &name) {
            continue;
        }

        if value.is_empty() && catalog::BOOLEAN_ATTRIBUTES.contains(name.as_str()) {
            value = name.clone();
        }

        if let Some(rules) = spec.rules_for(element, &name) {
            match rules.apply(&value) {
                Some(checked) => value = checked,
                None => continue,
            }
        }

        if config.lowercase_enums && catalog::ENUMERATED_ATTRIBUTES.contains(name.as_str()) {
            value = value.to_ascii_lowercase();
        }

        if config.translate_deprecated {
            if let Some(decl) = presentational_style(element, &name, &value) {
                styles.push(decl);
                continue;
            }
        }

        if name == "srcset" {
            match urls::check_srcset(&value, config) {
                UrlVerdict::Keep(checked) => value = checked,
                UrlVerdict::KeepFlagged(checked) => {
                    value = checked;
                    nofollow = true;
                }
                UrlVerdict::Drop => continue,
            }
        } else if catalog::URL_ATTRIBUTES.contains(name.as_str()) {
            match urls::check_url(&value, &name, config) {
                UrlVerdict::Keep(checked) => value = checked,
                UrlVerdict::KeepFlagged(checked) => {
                    value = checked;
                    nofollow = true;
                }
                UrlVerdict::Drop => continue,
            }
        }

        if name == "style" {
            if value.to_ascii_lowercase().contains("expression(") || value.contains('\\') {
                continue;
            }
            match urls::check_style_urls(&value, config) {
                Some(checked) => value = checked,
                None => continue,
            }
        }

        push_attr(&mut out, &name, value);
    }

    if !styles.is_empty() && !config.deny_attributes.denies("style") {
        let merged = styles.join("; ");
        if let Some(pos) = out.iter().position(|(n, _)| n == "style") {
            let existing = out[pos].1.trim_end().trim_end_matches(';').to_string();
            out[pos].1 = if existing.is_empty() {
                merged
            } else {
                format!("{existing}; {merged}")
            };
        } else {
            out.push(("style".to_string(), merged));
        }
    }

    if config.xml_lang != XmlLang::Off {
        if let Some(pos) = out.iter().position(|(n, _)| n == "lang") {
            let lang = out[pos].1.clone();
            if !out.iter().any(|(n, _)| n == "xml:lang") {
                out.push(("xml:lang".to_string(), lang));
            }
            if config.xml_lang == XmlLang::Replace {
                out.remove(pos);
            }
        }
    }

    if config.unique_ids != IdPolicy::Off {
        if let Some(pos) = out.iter().position(|(n, _)| n == "id") {
            let id = out[pos].1.clone();
            if !id.is_empty() && !registry.try_reserve(&id) {
                match config.unique_ids {
                    IdPolicy::Drop => {
                        out.remove(pos);
                    }
                    IdPolicy::Rename => {
                        let mut counter = 2;
                        loop {
                            let candidate = format!("{id}-{counter}");
                            if registry.try_reserve(&candidate) {
                                out[pos].1 = candidate;
                                break;
                            }
                            counter += 1;
                        }
                    }
                    IdPolicy::Off => {}
                }
            }
        }
    }

    if nofollow {
        if let Some(pos) = out.iter().position(|(n, _)| n == "rel") {
            let has_it = out[pos].1.split_whitespace().any(|token| token == "nofollow");
            if !has_it {
                if out[pos].1.is_empty() {
                    out[pos].1 = "nofollow".to_string();
                } else {
                    out[pos].1.push_str(" nofollow");
                }
            }
        } else {
            out.push(("rel".to_string(), "nofollow".to_string()));
        }
    }

    if let Some(required) = catalog::REQUIRED_ATTRIBUTES.get(element) {
        for (name, default) in *required {
            if !out.iter().any(|(n, _)| n == name) {
                out.push(((*name).to_string(), (*default).to_string()));
            }
        }
    }

    out
}
