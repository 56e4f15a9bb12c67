//! Attribute-rule specification: per-element, per-attribute value rules.
//!
//! A `Specification` further restricts or explicitly re-permits attributes
//! beyond the `Config`. It is built from the compact textual grammar
//! (`element=attr(rule/rule),attr,-attr;element2=...`) or from an
//! equivalent JSON document.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Rule set for one attribute of one element.
#[derive(Debug, Clone, Default)]
pub struct AttrRules {
    /// Maximum value length in characters.
    pub max_len: Option<usize>,
    /// Minimum value length in characters.
    pub min_len: Option<usize>,
    /// Maximum numeric value (non-numeric values fail the rule).
    pub max_val: Option<f64>,
    /// Minimum numeric value.
    pub min_val: Option<f64>,
    /// Pattern the value must match.
    pub pattern: Option<Regex>,
    /// Pattern the value must not match.
    pub no_pattern: Option<Regex>,
    /// Closed set of allowed values (compared case-insensitively).
    pub one_of: Option<HashSet<String>>,
    /// Set of disallowed values (compared case-insensitively).
    pub none_of: Option<HashSet<String>>,
    /// Substitute when a rule fails; without it the attribute is dropped.
    pub default: Option<String>,
}

impl AttrRules {
    /// Apply the rules to a value: `Some(value)` when it passes, the default
    /// when it fails and one is configured, `None` to drop the attribute.
    #[must_use]
    pub fn apply(&self, value: &str) -> Option<String> {
        if self.passes(value) {
            Some(value.to_string())
        } else {
            self.default.clone()
        }
    }

    fn passes(&self, value: &str) -> bool {
        let len = value.chars().count();
        if self.max_len.is_some_and(|max| len > max) {
            return false;
        }
        if self.min_len.is_some_and(|min| len < min) {
            return false;
        }
        if self.max_val.is_some() || self.min_val.is_some() {
            let Ok(number) = value.trim().parse::<f64>() else {
                return false;
            };
            if self.max_val.is_some_and(|max| number > max) {
                return false;
            }
            if self.min_val.is_some_and(|min| number < min) {
                return false;
            }
        }
        if self.pattern.as_ref().is_some_and(|re| !re.is_match(value)) {
            return false;
        }
        if self.no_pattern.as_ref().is_some_and(|re| re.is_match(value)) {
            return false;
        }
        let lowered = value.to_ascii_lowercase();
        if self.one_of.as_ref().is_some_and(|set| !set.contains(&lowered)) {
            return false;
        }
        if self.none_of.as_ref().is_some_and(|set| set.contains(&lowered)) {
            return false;
        }
        true
    }
}

/// Element → attribute rule map, with explicit per-element permit/deny sets.
#[derive(Debug, Clone, Default)]
pub struct Specification {
    rules: HashMap<String, HashMap<String, AttrRules>>,
    permitted: HashMap<String, HashSet<String>>,
    denied: HashMap<String, HashSet<String>>,
}

/// JSON form of one attribute's rules. String patterns are compiled when
/// the document is loaded.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawRules {
    maxlen: Option<usize>,
    minlen: Option<usize>,
    maxval: Option<f64>,
    minval: Option<f64>,
    #[serde(rename = "match")]
    pattern: Option<String>,
    nomatch: Option<String>,
    oneof: Option<Vec<String>>,
    noneof: Option<Vec<String>>,
    default: Option<String>,
    deny: Option<bool>,
}

impl Specification {
    /// Parse the compact grammar: `;` separates element groups, `=`
    /// separates the element list from its attribute rules, `,` separates
    /// attributes, `(`..`)` wraps an attribute's rule list, `/` separates
    /// rules, and a leading `-` denies the attribute. Pattern rule values
    /// carry their own delimiter (`match=%...%`), so `/` inside a pattern
    /// is safe.
    pub fn parse(text: &str) -> Result<Self> {
        let mut spec = Self::default();
        for group in text.split(';').map(str::trim).filter(|g| !g.is_empty()) {
            let (elements, attr_text) = group
                .split_once('=')
                .ok_or_else(|| Error::SpecParse(format!("missing `=` in group `{group}`")))?;
            let attrs = split_attrs(attr_text)?;
            for element in elements.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let element = element.to_ascii_lowercase();
                for (attr, rule_text) in &attrs {
                    if let Some(denied) = attr.strip_prefix('-') {
                        spec.denied
                            .entry(element.clone())
                            .or_default()
                            .insert(denied.to_string());
                        continue;
                    }
                    spec.permitted
                        .entry(element.clone())
                        .or_default()
                        .insert(attr.clone());
                    if let Some(rule_text) = rule_text {
                        let rules = parse_rules(rule_text)?;
                        spec.rules
                            .entry(element.clone())
                            .or_default()
                            .insert(attr.clone(), rules);
                    }
                }
            }
        }
        Ok(spec)
    }

    /// Load the JSON form: `{element: {attr: {maxlen: 10, ...}}}`.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, RawRules>> = serde_json::from_str(text)?;
        let mut spec = Self::default();
        for (element, attrs) in raw {
            let element = element.to_ascii_lowercase();
            for (attr, raw_rules) in attrs {
                let attr = attr.to_ascii_lowercase();
                if raw_rules.deny == Some(true) {
                    spec.denied
                        .entry(element.clone())
                        .or_default()
                        .insert(attr);
                    continue;
                }
                spec.permitted
                    .entry(element.clone())
                    .or_default()
                    .insert(attr.clone());
                let rules = raw_rules.compile()?;
                spec.rules
                    .entry(element.clone())
                    .or_default()
                    .insert(attr, rules);
            }
        }
        Ok(spec)
    }

    /// Rule set for an element/attribute pair, if any.
    #[must_use]
    pub fn rules_for(&self, element: &str, attr: &str) -> Option<&AttrRules> {
        self.rules.get(element).and_then(|attrs| attrs.get(attr))
    }

    /// Whether the specification explicitly re-permits this attribute.
    #[must_use]
    pub fn permits(&self, element: &str, attr: &str) -> bool {
        self.permitted
            .get(element)
            .is_some_and(|attrs| attrs.contains(attr))
    }

    /// Whether the specification explicitly denies this attribute.
    #[must_use]
    pub fn denies(&self, element: &str, attr: &str) -> bool {
        self.denied
            .get(element)
            .is_some_and(|attrs| attrs.contains(attr))
    }
}

impl RawRules {
    fn compile(self) -> Result<AttrRules> {
        Ok(AttrRules {
            max_len: self.maxlen,
            min_len: self.minlen,
            max_val: self.maxval,
            min_val: self.minval,
            pattern: self.pattern.as_deref().map(compile_pattern).transpose()?,
            no_pattern: self.nomatch.as_deref().map(compile_pattern).transpose()?,
            one_of: self
                .oneof
                .map(|vals| vals.into_iter().map(|v| v.to_ascii_lowercase()).collect()),
            none_of: self
                .noneof
                .map(|vals| vals.into_iter().map(|v| v.to_ascii_lowercase()).collect()),
            default: self.default,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| Error::BadPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

/// Split an attribute list on commas outside parentheses, returning each
/// attribute name with its optional raw rule text.
fn split_attrs(text: &str) -> Result<Vec<(String, Option<String>)>> {
    let mut attrs = Vec::new();
    let mut depth = 0usize;
    let mut piece = String::new();
    for ch in text.chars() {
        match ch {
            '(' => {
                depth += 1;
                piece.push(ch);
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::SpecParse(format!("unbalanced `)` in `{text}`")))?;
                piece.push(ch);
            }
            ',' if depth == 0 => {
                push_attr(&mut attrs, &piece)?;
                piece.clear();
            }
            _ => piece.push(ch),
        }
    }
    if depth != 0 {
        return Err(Error::SpecParse(format!("unbalanced `(` in `{text}`")));
    }
    push_attr(&mut attrs, &piece)?;
    Ok(attrs)
}

fn push_attr(attrs: &mut Vec<(String, Option<String>)>, piece: &str) -> Result<()> {
    let piece = piece.trim();
    if piece.is_empty() {
        return Ok(());
    }
    match piece.split_once('(') {
        Some((name, rest)) => {
            let rules = rest
                .strip_suffix(')')
                .ok_or_else(|| Error::SpecParse(format!("missing `)` after `{name}(`")))?;
            attrs.push((name.trim().to_ascii_lowercase(), Some(rules.to_string())));
        }
        None => attrs.push((piece.to_ascii_lowercase(), None)),
    }
    Ok(())
}

/// Parse a `/`-separated rule list. `match`/`nomatch` values carry their own
/// delimiter character so patterns may contain `/`.
fn parse_rules(text: &str) -> Result<AttrRules> {
    let mut rules = AttrRules::default();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let (kind, after_eq) = rest
            .split_once('=')
            .ok_or_else(|| Error::SpecParse(format!("missing `=` in rule `{rest}`")))?;
        let kind = kind.trim().to_ascii_lowercase();

        let (value, remaining) = if kind == "match" || kind == "nomatch" {
            take_delimited(after_eq)
                .ok_or_else(|| Error::SpecParse(format!("unterminated pattern in `{rest}`")))?
        } else {
            match after_eq.split_once('/') {
                Some((value, remaining)) => (value, remaining),
                None => (after_eq, ""),
            }
        };
        let value = value.trim();

        match kind.as_str() {
            "maxlen" => rules.max_len = Some(parse_number(value)?),
            "minlen" => rules.min_len = Some(parse_number(value)?),
            "maxval" => rules.max_val = Some(parse_float(value)?),
            "minval" => rules.min_val = Some(parse_float(value)?),
            "match" => rules.pattern = Some(compile_pattern(value)?),
            "nomatch" => rules.no_pattern = Some(compile_pattern(value)?),
            "oneof" => {
                rules.one_of =
                    Some(value.split('|').map(|v| v.trim().to_ascii_lowercase()).collect());
            }
            "noneof" => {
                rules.none_of =
                    Some(value.split('|').map(|v| v.trim().to_ascii_lowercase()).collect());
            }
            "default" => rules.default = Some(value.to_string()),
            other => {
                return Err(Error::SpecParse(format!("unknown rule kind `{other}`")));
            }
        }

        rest = remaining.trim_start_matches('/').trim();
    }
    Ok(rules)
}

/// Pattern values are wrapped in a caller-chosen delimiter: `%^https?:%`.
/// Returns the inner pattern and the text after the closing delimiter.
fn take_delimited(text: &str) -> Option<(&str, &str)> {
    let mut chars = text.char_indices();
    let (_, delim) = chars.next()?;
    let body_start = delim.len_utf8();
    let close = text[body_start..].find(delim)?;
    let value = &text[body_start..body_start + close];
    let rest = &text[body_start + close + delim.len_utf8()..];
    Some((value, rest))
}

fn parse_number(value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| Error::SpecParse(format!("expected integer, got `{value}`")))
}

fn parse_float(value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| Error::SpecParse(format!("expected number, got `{value}`")))
}
