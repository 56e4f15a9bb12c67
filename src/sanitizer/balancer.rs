//! Tag balancer.
//!
//! Consumes the validated token stream and emits nesting-correct, fully
//! closed output. A plain loop over an explicit open-element stack: no
//! recursion, so pathological nesting depth cannot exhaust the call stack.
//! All nesting rules come from the catalog tables; the algorithm itself is
//! generic.

use crate::catalog::{self, Category, ContentModel};
use crate::config::{Config, InvalidMarkup};
use crate::sanitizer::tokenizer::{serialize_open, Token};
use crate::shield::{SHIELD_CLOSE, SHIELD_OPEN};

/// Balance the token stream: repair out-of-order closes, relocate elements
/// to a valid ancestor, and close everything left open at end of stream.
#[must_use]
pub fn balance(tokens: &[Token], config: &Config) -> String {
    let mut balancer = Balancer {
        config,
        stack: Vec::new(),
        out: String::new(),
    };
    for token in tokens {
        match token {
            Token::Text(text) => balancer.text(text),
            Token::Open { name, attrs, void } => balancer.open(name, attrs, *void),
            Token::Close(name) => balancer.close(name),
        }
    }
    balancer.close_to(0);
    balancer.out
}

/// Serialize the stream without nesting repair (balancing disabled).
#[must_use]
pub fn serialize_stream(tokens: &[Token], config: &Config) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Open { name, attrs, void } => {
                out.push_str(&serialize_open(name, attrs, *void, config));
            }
            Token::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
    out
}

struct Balancer<'a> {
    config: &'a Config,
    stack: Vec<String>,
    out: String,
}

impl Balancer<'_> {
    fn text(&mut self, text: &str) {
        if !has_visible_text(text) {
            self.out.push_str(text);
            return;
        }
        let parent = self.stack.last().map_or(self.config.parent.as_str(), String::as_str);
        if accepts_text(parent) {
            self.out.push_str(text);
        } else if let Some(&wrapper) = catalog::TEXT_WRAPPERS.get(parent) {
            // Legalize bare text (e.g. directly inside a list) by wrapping
            // it in the parent's natural child.
            self.out.push('<');
            self.out.push_str(wrapper);
            self.out.push('>');
            self.out.push_str(text);
            self.out.push_str("</");
            self.out.push_str(wrapper);
            self.out.push('>');
        }
        // No wrapper legalizes it: the text is dropped.
    }

    fn open(&mut self, name: &str, attrs: &[(String, String)], void: bool) {
        // An ancestor that excludes this element closes first, however deep
        // the element would otherwise nest (anchors in anchors, forms in
        // forms, media in media).
        if let Some(cut) = self
            .stack
            .iter()
            .position(|ancestor| excludes(ancestor, name))
        {
            self.close_to(cut);
        }

        loop {
            if self.stack.is_empty() {
                // Root level: the configured parent decides, but emission is
                // permissive so content without a legal ancestor (stray list
                // items) survives at depth zero.
                self.emit_open(name, attrs, void);
                return;
            }

            let top = self.stack.len() - 1;
            if self.accepts_at(top, name) {
                self.emit_open(name, attrs, void);
                return;
            }

            // Deepest ancestor that accepts the element wins; everything
            // between it and the top closes.
            if let Some(depth) = (0..top).rev().find(|&i| self.accepts_at(i, name)) {
                self.close_to(depth + 1);
                self.emit_open(name, attrs, void);
                return;
            }
            if accepts_child(&self.config.parent, name, false) {
                self.close_to(0);
                self.emit_open(name, attrs, void);
                return;
            }

            // No ancestor accepts it. An implicitly closable parent closes
            // and the placement retries (list items, cells, options).
            let closable = self
                .stack
                .last()
                .is_some_and(|parent| catalog::is_closable_by_omission(parent));
            if closable {
                self.close_to(self.stack.len() - 1);
                continue;
            }

            if self.config.invalid_markup == InvalidMarkup::Escape {
                let serialized = serialize_open(name, attrs, void, self.config);
                self.out
                    .push_str(&serialized.replace('<', "&lt;").replace('>', "&gt;"));
            }
            return;
        }
    }

    fn close(&mut self, name: &str) {
        // Out-of-order closes close everything above the element first;
        // unmatched closes are dropped.
        if let Some(pos) = self.stack.iter().rposition(|open| open.as_str() == name) {
            self.close_to(pos);
        }
    }

    fn emit_open(&mut self, name: &str, attrs: &[(String, String)], void: bool) {
        self.out
            .push_str(&serialize_open(name, attrs, void, self.config));
        if !void {
            self.stack.push(name.to_string());
        }
    }

    fn close_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            if let Some(name) = self.stack.pop() {
                self.out.push_str("</");
                self.out.push_str(&name);
                self.out.push('>');
            }
        }
    }

    /// Whether the element at stack depth `i` accepts `child` directly.
    /// Transparent elements (`ins`/`del`) act inline-only when nested
    /// inside another transparent element.
    fn accepts_at(&self, i: usize, child: &str) -> bool {
        let parent = &self.stack[i];
        let inline_only = catalog::is_transparent(parent)
            && self.stack[..i].iter().any(|a| catalog::is_transparent(a));
        accepts_child(parent, child, inline_only)
    }
}

/// Uncataloged names that reached the balancer are custom or explicitly
/// admitted elements: they nest anywhere and accept anything.
fn is_permissive(name: &str) -> bool {
    !catalog::is_known(name)
}

fn excludes(ancestor: &str, child: &str) -> bool {
    catalog::EXCLUSIONS
        .get(ancestor)
        .is_some_and(|set| set.contains(child))
}

/// Direct-child validity, in priority order: only-children table, "other"
/// category parent table, exclusions, then general category compatibility.
fn accepts_child(parent: &str, child: &str, inline_only: bool) -> bool {
    if is_permissive(parent) || is_permissive(child) {
        return true;
    }
    if let Some(children) = catalog::ONLY_CHILDREN.get(parent) {
        return children.contains(child);
    }
    if catalog::category(child) == Category::Other {
        return catalog::VALID_PARENTS
            .get(child)
            .is_some_and(|parents| parents.contains(parent));
    }
    if excludes(parent, child) {
        return false;
    }
    match catalog::content_model(parent) {
        ContentModel::Empty | ContentModel::Text | ContentModel::Children => false,
        ContentModel::Inline => catalog::is_inline(child),
        ContentModel::Flow => !inline_only || catalog::is_inline(child),
    }
}

fn accepts_text(parent: &str) -> bool {
    if is_permissive(parent) {
        return true;
    }
    matches!(
        catalog::content_model(parent),
        ContentModel::Inline | ContentModel::Flow | ContentModel::Text
    )
}

/// Whether the text node contains anything beyond whitespace and shielded
/// sections. Whitespace and surviving comment/CDATA envelopes are legal in
/// any container.
fn has_visible_text(text: &str) -> bool {
    let mut shielded = false;
    for c in text.chars() {
        match c {
            SHIELD_OPEN => shielded = true,
            SHIELD_CLOSE => shielded = false,
            _ if shielded || c.is_whitespace() => {}
            _ => return true,
        }
    }
    false
}
