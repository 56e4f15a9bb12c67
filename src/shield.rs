//! Comment/CDATA shielding.
//!
//! Comment and CDATA bodies are pulled out before tag parsing and, when
//! kept, wrapped in a marker envelope of private bytes so the tokenizer and
//! balancer skip over them. The marker bytes (0x01-0x05) cannot appear in
//! ordinary input: they are stripped as illegal control characters at the
//! very start of processing. The finalizer restores them at the end.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, SectionPolicy};

/// Opens a shielded envelope.
pub const SHIELD_OPEN: char = '\u{1}';
/// Closes a shielded envelope.
pub const SHIELD_CLOSE: char = '\u{2}';
/// Disguised `&` inside an envelope.
pub const MARK_AMP: char = '\u{3}';
/// Disguised `<` inside an envelope.
pub const MARK_LT: char = '\u{4}';
/// Disguised `>` inside an envelope.
pub const MARK_GT: char = '\u{5}';

/// Runs of two or more hyphens inside a comment body.
#[allow(clippy::expect_used)]
static HYPHEN_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("HYPHEN_RUN_RE regex"));

/// Remove the control characters that are illegal in character data,
/// keeping tab, line feed, and carriage return. Guarantees the shield
/// marker bytes cannot occur in ordinary input.
#[must_use]
pub fn strip_controls(text: &str) -> String {
    text.chars()
        .filter(|&c| !matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}'))
        .collect()
}

/// Extract comment and CDATA sections ahead of tag parsing, applying the
/// configured policy to each. Runs after entity normalization, so `&` in
/// section bodies is already escaped.
#[must_use]
pub fn shield(text: &str, config: &Config) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let comment = rest.find("<!--");
        let cdata = rest.find("<![CDATA[");
        let (start, is_comment) = match (comment, cdata) {
            (Some(c), Some(d)) if c <= d => (c, true),
            (Some(c), None) => (c, true),
            (_, Some(d)) => (d, false),
            (None, None) => break,
        };

        out.push_str(&rest[..start]);
        rest = &rest[start..];

        if is_comment {
            let body_start = 4;
            let (body, after) = match rest[body_start..].find("-->") {
                Some(end) => (&rest[body_start..body_start + end], &rest[body_start + end + 3..]),
                // Unterminated comment swallows the rest of the input.
                None => (&rest[body_start..], ""),
            };
            emit_comment(&mut out, body, config.comments);
            rest = after;
        } else {
            let body_start = 9;
            let (body, after) = match rest[body_start..].find("]]>") {
                Some(end) => (&rest[body_start..body_start + end], &rest[body_start + end + 3..]),
                None => (&rest[body_start..], ""),
            };
            emit_cdata(&mut out, body, config.cdata);
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

fn emit_comment(out: &mut String, body: &str, policy: SectionPolicy) {
    match policy {
        SectionPolicy::Strip => {}
        SectionPolicy::Encode => out.push_str(&encode_angles(body)),
        SectionPolicy::Pass => {
            // Well-formedness: no `--` runs inside a comment, and a space
            // before the closing delimiter.
            let mut body = HYPHEN_RUN_RE.replace_all(body, "-").into_owned();
            if !body.ends_with(' ') {
                body.push(' ');
            }
            out.push(SHIELD_OPEN);
            out.push_str(&disguise(&format!("<!--{body}-->")));
            out.push(SHIELD_CLOSE);
        }
    }
}

fn emit_cdata(out: &mut String, body: &str, policy: SectionPolicy) {
    match policy {
        SectionPolicy::Strip => {}
        SectionPolicy::Encode => out.push_str(&encode_angles(body)),
        SectionPolicy::Pass => {
            out.push(SHIELD_OPEN);
            out.push_str(&disguise(&format!("<![CDATA[{body}]]>")));
            out.push(SHIELD_CLOSE);
        }
    }
}

fn encode_angles(body: &str) -> String {
    body.replace('<', "&lt;").replace('>', "&gt;")
}

fn disguise(section: &str) -> String {
    section
        .chars()
        .map(|c| match c {
            '&' => MARK_AMP,
            '<' => MARK_LT,
            '>' => MARK_GT,
            other => other,
        })
        .collect()
}

/// Restore marker bytes back to literal characters in shielded regions that
/// survived filtering. The final pipeline step.
#[must_use]
pub fn unshield(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            SHIELD_OPEN | SHIELD_CLOSE => None,
            MARK_AMP => Some('&'),
            MARK_LT => Some('<'),
            MARK_GT => Some('>'),
            other => Some(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(comments: SectionPolicy, cdata: SectionPolicy) -> Config {
        Config {
            comments,
            cdata,
            ..Config::default()
        }
    }

    #[test]
    fn strip_controls_removes_marker_range() {
        let input = "a\u{1}b\u{2}c\u{5}d\u{0}e";
        assert_eq!(strip_controls(input), "abcde");
    }

    #[test]
    fn strip_controls_keeps_whitespace() {
        assert_eq!(strip_controls("a\tb\nc\rd"), "a\tb\nc\rd");
    }

    #[test]
    fn strip_mode_removes_comment() {
        let config = config_with(SectionPolicy::Strip, SectionPolicy::Strip);
        assert_eq!(shield("a<!-- hidden -->b", &config), "ab");
    }

    #[test]
    fn encode_mode_escapes_comment_body() {
        let config = config_with(SectionPolicy::Encode, SectionPolicy::Strip);
        assert_eq!(shield("a<!-- <b> -->b", &config), "a &lt;b&gt; b");
    }

    #[test]
    fn pass_mode_round_trips_through_unshield() {
        let config = config_with(SectionPolicy::Pass, SectionPolicy::Strip);
        let shielded = shield("a<!-- note -->b", &config);
        assert!(!shielded.contains('<'));
        assert_eq!(unshield(&shielded), "a<!-- note -->b");
    }

    #[test]
    fn pass_mode_collapses_hyphen_runs() {
        let config = config_with(SectionPolicy::Pass, SectionPolicy::Strip);
        let shielded = shield("<!-- a -- b ---->", &config);
        assert_eq!(unshield(&shielded), "<!-- a - b - -->");
    }

    #[test]
    fn unterminated_comment_swallows_rest() {
        let config = config_with(SectionPolicy::Strip, SectionPolicy::Strip);
        assert_eq!(shield("a<!-- no close", &config), "a");
    }

    #[test]
    fn cdata_strip_and_pass() {
        let strip = config_with(SectionPolicy::Strip, SectionPolicy::Strip);
        assert_eq!(shield("x<![CDATA[ raw <b> ]]>y", &strip), "xy");

        let pass = config_with(SectionPolicy::Strip, SectionPolicy::Pass);
        let shielded = shield("x<![CDATA[ raw <b> ]]>y", &pass);
        assert!(!shielded.contains("<b>"));
        assert_eq!(unshield(&shielded), "x<![CDATA[ raw <b> ]]>y");
    }

    #[test]
    fn comment_before_cdata_scans_left_to_right() {
        let config = config_with(SectionPolicy::Strip, SectionPolicy::Pass);
        let out = shield("<!-- a <![CDATA[ b ]]> --> c", &config);
        // The CDATA open lives inside the comment, so the comment wins and
        // swallows through its own terminator.
        assert_eq!(out, " c");
    }
}
