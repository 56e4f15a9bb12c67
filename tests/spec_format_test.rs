//! The compact specification grammar and its JSON twin, exercised through
//! the public API.

use scour::{sanitize, AttributeDenyList, Config, Error, Specification};

fn sanitize_with(input: &str, spec: &Specification) -> String {
    sanitize(input, &Config::default(), spec)
}

#[test]
fn value_rules_restrict_attributes() {
    let spec = Specification::parse("img=width(maxval=600/default=600),height(maxval=600)")
        .expect("spec parses");
    assert_eq!(
        sanitize_with(r#"<img width="9999" height="9999" src="i.png" alt="i">"#, &spec),
        r#"<img width="600" src="i.png" alt="i">"#
    );
}

#[test]
fn spec_denies_attributes_per_element() {
    let spec = Specification::parse("a=-target;img=-longdesc").expect("spec parses");
    assert_eq!(
        sanitize_with(r#"<a href="/x" target="_blank">l</a>"#, &spec),
        r#"<a href="/x">l</a>"#
    );
}

#[test]
fn spec_permits_nonstandard_attributes() {
    let spec = Specification::parse("p=wibble").expect("spec parses");
    assert_eq!(
        sanitize_with(r#"<p wibble="1">x</p>"#, &spec),
        r#"<p wibble="1">x</p>"#
    );
    // Without the spec entry the attribute is unrecognized.
    assert_eq!(
        sanitize_with(r#"<p wibble="1">x</p>"#, &Specification::default()),
        "<p>x</p>"
    );
}

#[test]
fn oneof_rule_with_default_substitution() {
    let spec = Specification::parse("input=type(oneof=text|radio|checkbox/default=text)")
        .expect("spec parses");
    assert_eq!(
        sanitize_with(r#"<input type="radio">"#, &spec),
        r#"<input type="radio">"#
    );
    assert_eq!(
        sanitize_with(r#"<input type="button">"#, &spec),
        r#"<input type="text">"#
    );
}

#[test]
fn pattern_rule_with_custom_delimiter() {
    let spec = Specification::parse("a=href(match=%^(https://|/)%)").expect("spec parses");
    assert_eq!(
        sanitize_with(r#"<a href="https://ok.example/">x</a>"#, &spec),
        r#"<a href="https://ok.example/">x</a>"#
    );
    assert_eq!(sanitize_with(r#"<a href="ftp://no.example/">x</a>"#, &spec), "<a>x</a>");
}

#[test]
fn element_groups_share_rules() {
    let spec = Specification::parse("td,th=colspan(maxval=4/default=1)").expect("spec parses");
    assert_eq!(
        sanitize_with(r#"<table><tr><th colspan="9">h</th><td colspan="2">d</td></tr></table>"#, &spec),
        r#"<table><tr><th colspan="1">h</th><td colspan="2">d</td></tr></table>"#
    );
}

#[test]
fn minlen_drops_short_values() {
    let spec = Specification::parse("a=title(minlen=3)").expect("spec parses");
    assert_eq!(
        sanitize_with(r#"<a href="/x" title="ab">l</a>"#, &spec),
        r#"<a href="/x">l</a>"#
    );
}

#[test]
fn json_specification_equivalent() {
    let spec = Specification::from_json(
        r#"{"img": {"width": {"maxval": 600, "default": "600"}, "longdesc": {"deny": true}}}"#,
    )
    .expect("json spec parses");
    assert_eq!(
        sanitize_with(r#"<img width="9999" longdesc="/d" src="i.png" alt="i">"#, &spec),
        r#"<img width="600" src="i.png" alt="i">"#
    );
}

#[test]
fn spec_cannot_override_config_deny() {
    let config = Config {
        deny_attributes: AttributeDenyList::parse("target"),
        ..Config::default()
    };
    let spec = Specification::parse("a=target").expect("spec parses");
    assert_eq!(
        sanitize(r#"<a href="/x" target="_blank">l</a>"#, &config, &spec),
        r#"<a href="/x">l</a>"#
    );
}

#[test]
fn malformed_grammar_reports_errors() {
    assert!(matches!(
        Specification::parse("a"),
        Err(Error::SpecParse(_))
    ));
    assert!(matches!(
        Specification::parse("a=href(maxlen=ten)"),
        Err(Error::SpecParse(_))
    ));
    assert!(matches!(
        Specification::parse("a=href(match=%unterminated)"),
        Err(Error::SpecParse(_))
    ));
    assert!(matches!(
        Specification::parse("a=href(match=%[%)"),
        Err(Error::BadPattern { .. })
    ));
}
