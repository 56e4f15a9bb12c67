//! Tag tokenizer.
//!
//! Splits shielded text into a stream of opening-tag, closing-tag, and text
//! tokens. Element names are gated against the configuration here, and the
//! attribute validator runs on every surviving opening tag, so the balancer
//! only ever sees tags that are allowed to appear in the output.

use crate::catalog;
use crate::config::{Config, InvalidMarkup};
use crate::registry::IdRegistry;
use crate::sanitizer::attrs;
use crate::spec::Specification;

/// One unit of the validated tag stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Validated opening tag with its final attribute list.
    Open {
        /// Lowercased (possibly rewritten) element name.
        name: String,
        /// Validated attributes in output order.
        attrs: Vec<(String, String)>,
        /// Element can never have children or a closing tag.
        void: bool,
    },
    /// Closing tag for an allowed, non-void element.
    Close(String),
    /// Literal character data, already entity-safe.
    Text(String),
}

/// A raw tag match before validation.
struct RawTag<'a> {
    closing: bool,
    name: String,
    attr_text: &'a str,
    self_closing: bool,
    consumed: usize,
}

/// Elements whose bodies are raw character data; when such an element is
/// discarded its body must go with it, whatever the invalid-markup policy.
fn swallows_content(name: &str) -> bool {
    matches!(name, "script" | "style")
}

/// Tokenize shielded text. Total: every byte of input is either emitted,
/// escaped, or deliberately discarded.
#[must_use]
pub fn tokenize(
    text: &str,
    config: &Config,
    spec: &Specification,
    registry: &mut dyn IdRegistry,
) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut buffer = String::new();
    let mut skip_stack: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(lt) = rest.find('<') {
        if skip_stack.is_empty() {
            buffer.push_str(&rest[..lt]);
        }
        rest = &rest[lt..];

        let Some(tag) = parse_tag(rest) else {
            // Not a parseable tag: the `<` becomes literal text.
            if skip_stack.is_empty() {
                buffer.push_str("&lt;");
            }
            rest = &rest[1..];
            continue;
        };
        let raw = &rest[..tag.consumed];
        rest = &rest[tag.consumed..];

        // Declarations and processing instructions vanish silently.
        if tag.name.is_empty() {
            continue;
        }

        // Inside a discarded element's content, only the matching closing
        // tag (or a nested reopen) matters.
        if let Some(top) = skip_stack.last() {
            if tag.name == *top {
                if tag.closing {
                    skip_stack.pop();
                } else if !tag.self_closing {
                    skip_stack.push(tag.name.clone());
                }
            }
            continue;
        }

        if tag.closing {
            handle_closing(&tag, raw, config, &mut tokens, &mut buffer);
        } else {
            handle_opening(
                &tag, raw, config, spec, registry, &mut tokens, &mut buffer, &mut skip_stack,
            );
        }
    }

    if skip_stack.is_empty() {
        buffer.push_str(rest);
    }
    flush(&mut tokens, &mut buffer);
    tokens
}

fn handle_closing(
    tag: &RawTag<'_>, raw: &str, config: &Config, tokens: &mut Vec<Token>, buffer: &mut String,
) {
    let mut name = tag.name.clone();
    if config.translate_deprecated {
        if let Some(&(replacement, _)) = catalog::DEPRECATED_ELEMENTS.get(name.as_str()) {
            name = replacement.to_string();
        }
    }

    if !element_allowed(&name, config) {
        reject(raw, config, buffer);
        return;
    }
    if catalog::is_void(&name) {
        // Closing tags for void elements are illegal.
        if config.invalid_markup == InvalidMarkup::Escape {
            buffer.push_str(&escape_tag(raw));
        }
        return;
    }

    flush(tokens, buffer);
    tokens.push(Token::Close(name));
}

#[allow(clippy::too_many_arguments)]
fn handle_opening(
    tag: &RawTag<'_>,
    raw: &str,
    config: &Config,
    spec: &Specification,
    registry: &mut dyn IdRegistry,
    tokens: &mut Vec<Token>,
    buffer: &mut String,
    skip_stack: &mut Vec<String>,
) {
    let mut parsed = attrs::parse_attributes(tag.attr_text);

    let mut name = tag.name.clone();
    let mut extra_style = None;
    if config.translate_deprecated {
        if let Some((replacement, style)) = attrs::rewrite_deprecated(&name, &mut parsed) {
            name = replacement;
            extra_style = style;
        }
    }

    if !element_allowed(&name, config) {
        reject(raw, config, buffer);
        let discard_content = config.invalid_markup == InvalidMarkup::DiscardWithContent
            || swallows_content(&tag.name);
        if discard_content
            && config.invalid_markup != InvalidMarkup::Escape
            && !tag.self_closing
            && !catalog::is_void(&name)
        {
            skip_stack.push(tag.name.clone());
        }
        return;
    }

    let validated = attrs::validate(&name, parsed, extra_style, config, spec, registry);
    let void = catalog::is_void(&name);

    flush(tokens, buffer);
    tokens.push(Token::Open {
        name: name.clone(),
        attrs: validated,
        void,
    });
    if tag.self_closing && !void {
        tokens.push(Token::Close(name));
    }
}

/// Gate an element name against the allowed set: catalog elements go
/// through the wildcard policy, hyphenated names need the custom-element
/// policy (or an explicit add), anything else needs an explicit add.
fn element_allowed(name: &str, config: &Config) -> bool {
    if catalog::is_known(name) {
        return config.elements.allows(name);
    }
    if config.elements.explicitly_added(name) {
        return true;
    }
    catalog::is_custom_name(name) && config.custom_elements && !config.elements.removes(name)
}

fn reject(raw: &str, config: &Config, buffer: &mut String) {
    if config.invalid_markup == InvalidMarkup::Escape {
        buffer.push_str(&escape_tag(raw));
    }
}

fn flush(tokens: &mut Vec<Token>, buffer: &mut String) {
    if !buffer.is_empty() {
        tokens.push(Token::Text(std::mem::take(buffer)));
    }
}

fn escape_tag(raw: &str) -> String {
    raw.replace('<', "&lt;").replace('>', "&gt;")
}

/// Try to parse a tag at the start of `rest` (which begins with `<`).
/// Returns `None` when the text cannot form a tag: no closing `>`, or a
/// name that does not start with a letter. Declarations (`<!`, `<?`) are
/// consumed and dropped via a zero-length name sentinel handled here.
fn parse_tag(rest: &str) -> Option<RawTag<'_>> {
    let after_lt = &rest[1..];

    // Declarations and processing instructions: consume to `>` silently.
    if after_lt.starts_with('!') || after_lt.starts_with('?') {
        let end = after_lt.find('>')?;
        return Some(RawTag {
            closing: true,
            name: String::new(),
            attr_text: "",
            self_closing: false,
            consumed: end + 2,
        });
    }

    let (closing, name_start) = if after_lt.starts_with('/') {
        (true, 2)
    } else {
        (false, 1)
    };

    let name_text = &rest[name_start..];
    if !name_text.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name_len = name_text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '_' | '-')))
        .unwrap_or(name_text.len());
    let name = name_text[..name_len].to_ascii_lowercase();

    // Find the closing `>`, honoring quoted attribute values.
    let body = &name_text[name_len..];
    let mut quote: Option<char> = None;
    let mut end = None;
    for (idx, c) in body.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => {
                    end = Some(idx);
                    break;
                }
                '<' => return None,
                _ => {}
            },
        }
    }
    let end = end?;

    let mut attr_text = &body[..end];
    let mut self_closing = false;
    let trimmed = attr_text.trim_end();
    if let Some(stripped) = trimmed.strip_suffix('/') {
        self_closing = true;
        attr_text = stripped;
    }

    Some(RawTag {
        closing,
        name,
        attr_text,
        self_closing,
        consumed: name_start + name_len + end + 1,
    })
}

/// Serialize a validated opening tag.
#[must_use]
pub fn serialize_open(
    name: &str,
    attrs: &[(String, String)],
    void: bool,
    config: &Config,
) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('<');
    out.push_str(name);
    for (attr, value) in attrs {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    if void && config.void_slash {
        out.push_str(" /");
    }
    out.push('>');
    out
}
