//! URL handling through the public API: scheme containment, base-URL
//! rewriting, and the anti-spam rules.

use regex::Regex;
use scour::{sanitize, Config, Specification, UrlForm};
use url::Url;

fn sanitize_default(input: &str) -> String {
    sanitize(input, &Config::default(), &Specification::default())
}

fn base(url: &str) -> Url {
    Url::parse(url).expect("valid base url")
}

#[test]
fn relative_and_fragment_urls_untouched() {
    assert_eq!(
        sanitize_default(r#"<a href="/about">x</a>"#),
        r#"<a href="/about">x</a>"#
    );
    assert_eq!(
        sanitize_default(r##"<a href="#top">x</a>"##),
        r##"<a href="#top">x</a>"##
    );
}

#[test]
fn disallowed_schemes_prefixed_per_context() {
    assert_eq!(
        sanitize_default(r#"<img src="javascript:x">"#),
        r#"<img src="denied:javascript:x" alt="image">"#
    );
    // mailto is allowed for href but not for src.
    assert_eq!(
        sanitize_default(r#"<a href="mailto:a@b.c">m</a>"#),
        r#"<a href="mailto:a@b.c">m</a>"#
    );
    assert_eq!(
        sanitize_default(r#"<img src="mailto:a@b.c">"#),
        r#"<img src="denied:mailto:a@b.c" alt="image">"#
    );
}

#[test]
fn scheme_smuggling_via_whitespace_blocked() {
    let out = sanitize_default("<a href=\"jav\tascript:alert(1)\">x</a>");
    assert!(out.contains("denied:"), "got `{out}`");
}

#[test]
fn urls_rewritten_to_absolute_form() {
    let config = Config {
        base_url: Some(base("https://example.com/dir/")),
        url_form: Some(UrlForm::Absolute),
        ..Config::default()
    };
    assert_eq!(
        sanitize(r#"<a href="../up">x</a>"#, &config, &Specification::default()),
        r#"<a href="https://example.com/up">x</a>"#
    );
}

#[test]
fn urls_rewritten_to_relative_form() {
    let config = Config {
        base_url: Some(base("https://example.com/dir/page")),
        url_form: Some(UrlForm::Relative),
        ..Config::default()
    };
    assert_eq!(
        sanitize(
            r#"<a href="https://example.com/dir/other">x</a>"#,
            &config,
            &Specification::default()
        ),
        r#"<a href="other">x</a>"#
    );
}

#[test]
fn spam_allow_pattern_drops_nonmatching_urls() {
    let config = Config {
        spam_allow: Some(Regex::new(r"^https://good\.example/").expect("valid pattern")),
        ..Config::default()
    };
    let spec = Specification::default();
    assert_eq!(
        sanitize(r#"<a href="https://good.example/p">x</a>"#, &config, &spec),
        r#"<a href="https://good.example/p">x</a>"#
    );
    assert_eq!(
        sanitize(r#"<a href="https://spam.example/p">x</a>"#, &config, &spec),
        "<a>x</a>"
    );
}

#[test]
fn spam_flag_pattern_adds_nofollow() {
    let config = Config {
        spam_flag: Some(Regex::new(r"sketchy").expect("valid pattern")),
        ..Config::default()
    };
    assert_eq!(
        sanitize(
            r#"<a href="https://sketchy.example/">x</a>"#,
            &config,
            &Specification::default()
        ),
        r#"<a href="https://sketchy.example/" rel="nofollow">x</a>"#
    );
}

#[test]
fn mailto_at_sign_obfuscated() {
    let config = Config {
        obfuscate_mailto: true,
        ..Config::default()
    };
    assert_eq!(
        sanitize(
            r#"<a href="mailto:bob@example.com">m</a>"#,
            &config,
            &Specification::default()
        ),
        r#"<a href="mailto:bob&#64;example.com">m</a>"#
    );
}

#[test]
fn style_url_references_validated() {
    assert_eq!(
        sanitize_default(r#"<p style="background: url(javascript:x)">y</p>"#),
        r#"<p style="background: url(denied:javascript:x)">y</p>"#
    );
    assert_eq!(
        sanitize_default(r#"<p style="background: url('https://x.example/i.png')">y</p>"#),
        r#"<p style="background: url(https://x.example/i.png)">y</p>"#
    );
}

#[test]
fn srcset_candidates_validated() {
    assert_eq!(
        sanitize_default(r#"<img srcset="a.png 1x, b.png 2x" src="a.png" alt="a">"#),
        r#"<img srcset="a.png 1x, b.png 2x" src="a.png" alt="a">"#
    );
    // One bad candidate poisons the attribute.
    let out = sanitize_default(r#"<img srcset="a.png 1x, javascript:x 2x" src="a.png" alt="a">"#);
    assert!(!out.contains("srcset"), "got `{out}`");
}

#[test]
fn every_output_url_is_scheme_contained() {
    let inputs = [
        r#"<a href="https://ok.example/">x</a>"#,
        r#"<a href="javascript:bad()">x</a>"#,
        r#"<img src="vbscript:bad">"#,
        r#"<a href="ftp://files.example/">x</a>"#,
        r#"<a href="data:text/html;base64,PHA+">x</a>"#,
        r#"<q cite="javascript:q()">x</q>"#,
    ];
    let attr_url = Regex::new(r#"(?:href|src|cite)="([^"]*)""#).expect("valid pattern");
    let config = Config::default();
    for input in inputs {
        let out = sanitize(input, &config, &Specification::default());
        for caps in attr_url.captures_iter(&out) {
            let value = &caps[1];
            if let Some((scheme, _)) = value.split_once(':') {
                let allowed = config
                    .schemes_for("href")
                    .is_some_and(|set| set.contains(scheme));
                assert!(
                    allowed || scheme == "denied",
                    "unconfined scheme `{scheme}` in `{out}`"
                );
            }
        }
    }
}
