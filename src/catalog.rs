//! Element catalog: classification tables driving validation and balancing.
//!
//! Every known element is classified into a category (void, inline, block,
//! "other") and a content model, and the nesting override tables live here
//! as constant maps so the balancer stays a single generic algorithm.
//! All tables are built once at first use via `LazyLock`.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Coarse element category used by the balancer's compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Never has children or a closing tag (br, img, hr, ...).
    Void,
    /// Phrasing-level element, legal wherever inline content is legal.
    Inline,
    /// Block-level element, needs a block or flow container.
    Block,
    /// Legal only under specific parents (li, td, option, ...).
    Other,
}

/// What a non-void element may directly contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentModel {
    /// No children at all.
    Empty,
    /// Character data only, no child elements.
    Text,
    /// Inline elements and text.
    Inline,
    /// Block elements, inline elements, and text.
    Flow,
    /// Only the children listed in `ONLY_CHILDREN`.
    Children,
}

/// Void (empty) elements. Head-only metadata elements (`base`, `link`,
/// `meta`) are deliberately absent: the engine sanitizes body fragments.
pub static VOID_ELEMENTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "area", "br", "col", "embed", "hr", "img", "input", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Inline (phrasing) elements. `ins` and `del` are transparent and appear in
/// both the inline and block sets.
pub static INLINE_ELEMENTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "abbr", "acronym", "audio", "b", "bdi", "bdo", "big", "br",
        "button", "canvas", "cite", "code", "data", "datalist", "del", "dfn",
        "em", "embed", "font", "i", "iframe", "img", "input", "ins", "kbd",
        "label", "map", "mark", "meter", "object", "output", "picture",
        "progress", "q", "ruby", "s", "samp", "select", "small", "span",
        "strike", "strong", "sub", "sup", "textarea", "time", "tt", "u",
        "var", "video", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Block-level elements.
pub static BLOCK_ELEMENTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "address", "article", "aside", "blockquote", "center", "del",
        "details", "dir", "div", "dl", "fieldset", "figure", "footer",
        "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup",
        "hr", "ins", "main", "menu", "nav", "ol", "p", "pre", "section",
        "table", "ul",
    ]
    .into_iter()
    .collect()
});

/// Elements legal only under specific parents (see `VALID_PARENTS`).
pub static OTHER_ELEMENTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "caption", "col", "colgroup", "dd", "dt", "figcaption", "legend",
        "li", "optgroup", "option", "rp", "rt", "summary", "tbody", "td",
        "tfoot", "th", "thead", "tr",
    ]
    .into_iter()
    .collect()
});

/// Elements whose content model is inline-only (phrasing + text).
static INLINE_CONTENT: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "abbr", "acronym", "b", "bdi", "bdo", "big", "button",
        "caption", "cite", "code", "data", "dfn", "dt", "em", "font",
        "figcaption", "h1", "h2", "h3", "h4", "h5", "h6", "i", "kbd",
        "label", "legend", "mark", "meter", "output", "p", "pre",
        "progress", "q", "rp", "rt", "ruby", "s", "samp", "small", "span",
        "strike", "strong", "sub", "summary", "sup", "time", "tt", "u",
        "var",
    ]
    .into_iter()
    .collect()
});

/// Elements that contain character data only.
static TEXT_CONTENT: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["option", "textarea", "title"].into_iter().collect()
});

/// Parents restricted to an explicit child list. Text is not legal in these
/// unless the element also appears in `TEXT_WRAPPERS` (the balancer wraps it).
pub static ONLY_CHILDREN: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        let table: [(&str, &[&str]); 14] = [
            ("colgroup", &["col"]),
            ("datalist", &["option"]),
            ("dl", &["dt", "dd"]),
            ("hgroup", &["h1", "h2", "h3", "h4", "h5", "h6"]),
            ("menu", &["li"]),
            ("ol", &["li"]),
            ("optgroup", &["option"]),
            ("picture", &["source", "img"]),
            ("select", &["option", "optgroup"]),
            ("table", &["caption", "colgroup", "thead", "tbody", "tfoot", "tr"]),
            ("tbody", &["tr"]),
            ("tfoot", &["tr"]),
            ("thead", &["tr"]),
            ("tr", &["td", "th"]),
        ];
        let mut map: HashMap<&'static str, HashSet<&'static str>> = table
            .into_iter()
            .map(|(parent, children)| (parent, children.iter().copied().collect()))
            .collect();
        map.insert("ul", ["li"].into_iter().collect());
        map
    });

/// Allowed parents for each "other"-category element.
pub static VALID_PARENTS: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        let table: [(&str, &[&str]); 19] = [
            ("caption", &["table"]),
            ("col", &["colgroup", "table"]),
            ("colgroup", &["table"]),
            ("dd", &["dl"]),
            ("dt", &["dl"]),
            ("figcaption", &["figure"]),
            ("legend", &["fieldset"]),
            ("li", &["ul", "ol", "menu", "dir"]),
            ("optgroup", &["select"]),
            ("option", &["select", "optgroup", "datalist"]),
            ("rp", &["ruby"]),
            ("rt", &["ruby"]),
            ("summary", &["details"]),
            ("tbody", &["table"]),
            ("td", &["tr"]),
            ("tfoot", &["table"]),
            ("th", &["tr"]),
            ("thead", &["table"]),
            ("tr", &["table", "thead", "tbody", "tfoot"]),
        ];
        table
            .into_iter()
            .map(|(child, parents)| (child, parents.iter().copied().collect()))
            .collect()
    });

/// Descendants an element may never contain, checked against every open
/// ancestor so `<a><b><a>` closes the outer anchor rather than nesting.
pub static EXCLUSIONS: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        const SECTIONING: &[&str] = &[
            "article", "aside", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
            "header", "nav", "section",
        ];
        let table: [(&str, &[&str]); 16] = [
            ("a", &["a"]),
            ("address", &["address"]),
            ("audio", &["audio", "video"]),
            ("button", &["a", "button", "form", "input", "label", "select", "textarea"]),
            ("dfn", &["dfn"]),
            ("footer", &["footer", "header"]),
            ("form", &["form"]),
            ("h1", SECTIONING),
            ("h2", SECTIONING),
            ("h3", SECTIONING),
            ("h4", SECTIONING),
            ("h5", SECTIONING),
            ("h6", SECTIONING),
            ("header", &["footer", "header"]),
            ("label", &["label"]),
            ("video", &["audio", "video"]),
        ];
        let mut map: HashMap<&'static str, HashSet<&'static str>> = table
            .into_iter()
            .map(|(el, excluded)| (el, excluded.iter().copied().collect()))
            .collect();
        map.insert("meter", ["meter"].into_iter().collect());
        map.insert("progress", ["progress"].into_iter().collect());
        map.insert("pre", ["big", "img", "object", "small", "sub", "sup"].into_iter().collect());
        map
    });

/// Elements whose closing tag may legally be absent in source markup; a
/// following sibling or parent close implies the close.
pub static CLOSABLE_BY_OMISSION: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "caption", "colgroup", "dd", "dt", "li", "optgroup", "option", "p",
        "rp", "rt", "tbody", "td", "tfoot", "th", "thead", "tr",
    ]
    .into_iter()
    .collect()
});

/// Wrapper inserted around bare text inside children-restricted parents.
pub static TEXT_WRAPPERS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [("dl", "dd"), ("menu", "li"), ("ol", "li"), ("tr", "td"), ("ul", "li")]
        .into_iter()
        .collect()
});

/// Attributes an element must carry, with the value synthesized when absent.
pub static REQUIRED_ATTRIBUTES: LazyLock<HashMap<&'static str, &'static [(&'static str, &'static str)]>> =
    LazyLock::new(|| {
        let mut map: HashMap<&'static str, &'static [(&'static str, &'static str)]> =
            HashMap::new();
        map.insert("img", &[("src", ""), ("alt", "image")]);
        map.insert("area", &[("alt", "area")]);
        map
    });

/// Global attributes, legal on every element.
pub static GLOBAL_ATTRIBUTES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "accesskey", "class", "contenteditable", "dir", "draggable",
        "hidden", "id", "lang", "role", "slot", "spellcheck", "style",
        "tabindex", "title", "translate", "xml:lang",
    ]
    .into_iter()
    .collect()
});

/// Element-specific attributes beyond the global set.
pub static ELEMENT_ATTRIBUTES: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        let table: [(&str, &[&str]); 45] = [
            ("a", &["charset", "coords", "download", "href", "hreflang", "media",
                    "name", "ping", "rel", "rev", "shape", "target", "type"]),
            ("area", &["alt", "coords", "download", "href", "hreflang", "nohref",
                       "rel", "shape", "target"]),
            ("audio", &["autoplay", "controls", "crossorigin", "loop", "muted",
                        "preload", "src"]),
            ("blockquote", &["cite"]),
            ("br", &["clear"]),
            ("button", &["autofocus", "disabled", "form", "formaction",
                         "formenctype", "formmethod", "formnovalidate",
                         "formtarget", "name", "type", "value"]),
            ("canvas", &["height", "width"]),
            ("caption", &["align"]),
            ("col", &["align", "span", "valign", "width"]),
            ("colgroup", &["align", "span", "valign", "width"]),
            ("data", &["value"]),
            ("del", &["cite", "datetime"]),
            ("details", &["open"]),
            ("div", &["align"]),
            ("dl", &["compact"]),
            ("embed", &["height", "src", "type", "width"]),
            ("fieldset", &["disabled", "form", "name"]),
            ("font", &["color", "face", "size"]),
            ("form", &["accept-charset", "action", "autocomplete", "enctype",
                       "method", "name", "novalidate", "target"]),
            ("hr", &["align", "noshade", "size", "width"]),
            ("iframe", &["allow", "allowfullscreen", "frameborder", "height",
                         "loading", "name", "referrerpolicy", "sandbox", "src",
                         "srcdoc", "width"]),
            ("img", &["align", "alt", "border", "crossorigin", "decoding",
                      "height", "hspace", "ismap", "loading", "longdesc",
                      "referrerpolicy", "sizes", "src", "srcset", "usemap",
                      "vspace", "width"]),
            ("input", &["accept", "alt", "autocomplete", "autofocus",
                        "checked", "dirname", "disabled", "form",
                        "formaction", "formenctype", "formmethod",
                        "formnovalidate", "formtarget", "height", "list",
                        "max", "maxlength", "min", "minlength", "multiple",
                        "name", "pattern", "placeholder", "readonly",
                        "required", "size", "src", "step", "type", "value",
                        "width"]),
            ("ins", &["cite", "datetime"]),
            ("label", &["for", "form"]),
            ("li", &["type", "value"]),
            ("map", &["name"]),
            ("meter", &["high", "low", "max", "min", "optimum", "value"]),
            ("object", &["data", "declare", "form", "height", "name",
                         "standby", "type", "usemap", "width"]),
            ("ol", &["compact", "reversed", "start", "type"]),
            ("optgroup", &["disabled", "label"]),
            ("option", &["disabled", "label", "selected", "value"]),
            ("output", &["for", "form", "name"]),
            ("p", &["align"]),
            ("progress", &["max", "value"]),
            ("q", &["cite"]),
            ("select", &["autofocus", "disabled", "form", "multiple", "name",
                         "required", "size"]),
            ("source", &["media", "sizes", "src", "srcset", "type"]),
            ("table", &["align", "bgcolor", "border", "cellpadding",
                        "cellspacing", "rules", "summary", "width"]),
            ("td", &["abbr", "align", "bgcolor", "colspan", "headers",
                     "height", "nowrap", "rowspan", "valign", "width"]),
            ("textarea", &["autocomplete", "autofocus", "cols", "dirname",
                           "disabled", "form", "maxlength", "minlength",
                           "name", "placeholder", "readonly", "required",
                           "rows", "wrap"]),
            ("time", &["datetime"]),
            ("track", &["default", "kind", "label", "src", "srclang"]),
            ("ul", &["compact", "type"]),
            ("video", &["autoplay", "controls", "crossorigin", "height",
                        "loop", "muted", "playsinline", "poster", "preload",
                        "src", "width"]),
        ];
        let mut map: HashMap<&'static str, HashSet<&'static str>> = table
            .into_iter()
            .map(|(el, attrs)| (el, attrs.iter().copied().collect()))
            .collect();
        // th shares the td list plus scope
        let mut th: HashSet<&'static str> = map
            .get("td")
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        th.insert("scope");
        map.insert("th", th);
        for heading in ["h1", "h2", "h3", "h4", "h5", "h6", "legend"] {
            map.insert(heading, ["align"].into_iter().collect());
        }
        for section in ["tbody", "tfoot", "thead", "tr"] {
            map.insert(section, ["align", "bgcolor", "valign"].into_iter().collect());
        }
        map
    });

/// Attributes whose value is a URL and must pass scheme validation.
pub static URL_ATTRIBUTES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "action", "background", "cite", "data", "formaction", "href",
        "longdesc", "ping", "poster", "src", "usemap",
    ]
    .into_iter()
    .collect()
});

/// Boolean attributes: normalized to repeat their own name as the value.
pub static BOOLEAN_ATTRIBUTES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "allowfullscreen", "autofocus", "autoplay", "checked", "compact",
        "controls", "declare", "default", "disabled", "formnovalidate",
        "hidden", "ismap", "loop", "multiple", "muted", "nohref", "noshade",
        "novalidate", "nowrap", "open", "playsinline", "readonly",
        "required", "reversed", "selected",
    ]
    .into_iter()
    .collect()
});

/// Attributes taking a case-insensitive enumerated value; lowercased when
/// the configuration asks for normalization.
pub static ENUMERATED_ATTRIBUTES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "align", "autocomplete", "clear", "contenteditable", "crossorigin",
        "decoding", "dir", "draggable", "enctype", "kind", "loading",
        "method", "preload", "referrerpolicy", "scope", "shape",
        "spellcheck", "translate", "valign", "wrap",
    ]
    .into_iter()
    .collect()
});

/// Deprecated element rewrites: name → (replacement, style declaration).
/// `font` maps its own size/color/face attributes instead of a fixed
/// declaration, handled by the attribute validator.
pub static DEPRECATED_ELEMENTS: LazyLock<HashMap<&'static str, (&'static str, Option<&'static str>)>> =
    LazyLock::new(|| {
        [
            ("acronym", ("abbr", None)),
            ("big", ("span", Some("font-size: larger"))),
            ("center", ("div", Some("text-align: center"))),
            ("dir", ("ul", None)),
            ("font", ("span", None)),
            ("s", ("span", Some("text-decoration: line-through"))),
            ("strike", ("span", Some("text-decoration: line-through"))),
            ("tt", ("span", Some("font-family: monospace"))),
            ("u", ("span", Some("text-decoration: underline"))),
        ]
        .into_iter()
        .collect()
    });

/// Legal custom-element name: lowercase start, at least one hyphen.
#[allow(clippy::expect_used)]
static CUSTOM_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9._]*-[a-z0-9._-]*$").expect("CUSTOM_NAME_RE regex")
});

/// Every element the catalog knows about.
pub static KNOWN_ELEMENTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    VOID_ELEMENTS
        .iter()
        .chain(INLINE_ELEMENTS.iter())
        .chain(BLOCK_ELEMENTS.iter())
        .chain(OTHER_ELEMENTS.iter())
        .copied()
        .collect()
});

/// Check if an element is void (can never have children or a closing tag).
#[inline]
#[must_use]
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(name)
}

/// Check if an element is inline (phrasing) level.
#[inline]
#[must_use]
pub fn is_inline(name: &str) -> bool {
    INLINE_ELEMENTS.contains(name)
}

/// Check if an element is block level.
#[inline]
#[must_use]
pub fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(name)
}

/// Check if an element is known to the catalog.
#[inline]
#[must_use]
pub fn is_known(name: &str) -> bool {
    KNOWN_ELEMENTS.contains(name)
}

/// Check if a name is a syntactically legal custom-element name.
#[inline]
#[must_use]
pub fn is_custom_name(name: &str) -> bool {
    name.contains('-') && CUSTOM_NAME_RE.is_match(name)
}

/// Category of an element. Custom elements count as inline so they fit in
/// any container; "other" wins over inline/block for the restricted set.
#[must_use]
pub fn category(name: &str) -> Category {
    if VOID_ELEMENTS.contains(name) {
        Category::Void
    } else if OTHER_ELEMENTS.contains(name) {
        Category::Other
    } else if BLOCK_ELEMENTS.contains(name) && !INLINE_ELEMENTS.contains(name) {
        Category::Block
    } else {
        Category::Inline
    }
}

/// True for the transparent elements that belong to both the inline and
/// block categories (`ins`, `del`).
#[inline]
#[must_use]
pub fn is_transparent(name: &str) -> bool {
    INLINE_ELEMENTS.contains(name) && BLOCK_ELEMENTS.contains(name)
}

/// Content model of an element. Unknown (custom) elements get `Flow`.
#[must_use]
pub fn content_model(name: &str) -> ContentModel {
    if VOID_ELEMENTS.contains(name) {
        ContentModel::Empty
    } else if ONLY_CHILDREN.contains_key(name) {
        ContentModel::Children
    } else if TEXT_CONTENT.contains(name) {
        ContentModel::Text
    } else if INLINE_CONTENT.contains(name) {
        ContentModel::Inline
    } else {
        ContentModel::Flow
    }
}

/// Check if an element's closing tag may be omitted in source markup.
#[inline]
#[must_use]
pub fn is_closable_by_omission(name: &str) -> bool {
    CLOSABLE_BY_OMISSION.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_assignment() {
        assert_eq!(category("br"), Category::Void);
        assert_eq!(category("span"), Category::Inline);
        assert_eq!(category("div"), Category::Block);
        assert_eq!(category("li"), Category::Other);
        assert_eq!(category("td"), Category::Other);
    }

    #[test]
    fn test_transparent_elements_are_dual() {
        assert!(is_transparent("ins"));
        assert!(is_transparent("del"));
        assert!(!is_transparent("span"));
        assert!(!is_transparent("div"));
    }

    #[test]
    fn test_content_models() {
        assert_eq!(content_model("br"), ContentModel::Empty);
        assert_eq!(content_model("p"), ContentModel::Inline);
        assert_eq!(content_model("div"), ContentModel::Flow);
        assert_eq!(content_model("ul"), ContentModel::Children);
        assert_eq!(content_model("textarea"), ContentModel::Text);
        assert_eq!(content_model("my-widget"), ContentModel::Flow);
    }

    #[test]
    fn test_only_children_tables() {
        assert!(ONLY_CHILDREN["ul"].contains("li"));
        assert!(!ONLY_CHILDREN["ul"].contains("p"));
        assert!(ONLY_CHILDREN["table"].contains("tr"));
        assert!(ONLY_CHILDREN["tr"].contains("td"));
        assert!(ONLY_CHILDREN["select"].contains("optgroup"));
    }

    #[test]
    fn test_valid_parents_cover_other_elements() {
        for name in OTHER_ELEMENTS.iter() {
            assert!(
                VALID_PARENTS.contains_key(name),
                "missing VALID_PARENTS entry for {name}"
            );
        }
    }

    #[test]
    fn test_exclusions() {
        assert!(EXCLUSIONS["a"].contains("a"));
        assert!(EXCLUSIONS["form"].contains("form"));
        assert!(EXCLUSIONS["video"].contains("audio"));
        assert!(EXCLUSIONS["h2"].contains("section"));
        assert!(!EXCLUSIONS["a"].contains("b"));
    }

    #[test]
    fn test_closable_by_omission() {
        assert!(is_closable_by_omission("li"));
        assert!(is_closable_by_omission("td"));
        assert!(is_closable_by_omission("p"));
        assert!(!is_closable_by_omission("div"));
        assert!(!is_closable_by_omission("span"));
    }

    #[test]
    fn test_custom_name_class() {
        assert!(is_custom_name("my-widget"));
        assert!(is_custom_name("x-a.b_c-d"));
        assert!(!is_custom_name("widget"));
        assert!(!is_custom_name("My-Widget"));
        assert!(!is_custom_name("-widget"));
        assert!(!is_custom_name("1-widget"));
    }

    #[test]
    fn test_required_attributes() {
        let img = REQUIRED_ATTRIBUTES["img"];
        assert!(img.iter().any(|(name, _)| *name == "src"));
        assert!(img.iter().any(|(name, _)| *name == "alt"));
    }

    #[test]
    fn test_element_attribute_tables() {
        assert!(ELEMENT_ATTRIBUTES["a"].contains("href"));
        assert!(ELEMENT_ATTRIBUTES["img"].contains("srcset"));
        assert!(ELEMENT_ATTRIBUTES["th"].contains("scope"));
        assert!(ELEMENT_ATTRIBUTES["td"].contains("colspan"));
        assert!(!ELEMENT_ATTRIBUTES["a"].contains("src"));
    }

    #[test]
    fn test_url_and_boolean_attributes() {
        assert!(URL_ATTRIBUTES.contains("href"));
        assert!(URL_ATTRIBUTES.contains("formaction"));
        assert!(!URL_ATTRIBUTES.contains("alt"));
        assert!(BOOLEAN_ATTRIBUTES.contains("checked"));
        assert!(BOOLEAN_ATTRIBUTES.contains("disabled"));
        assert!(!BOOLEAN_ATTRIBUTES.contains("value"));
    }

    #[test]
    fn test_deprecated_element_rewrites() {
        assert_eq!(DEPRECATED_ELEMENTS["center"], ("div", Some("text-align: center")));
        assert_eq!(DEPRECATED_ELEMENTS["strike"].0, "span");
        assert_eq!(DEPRECATED_ELEMENTS["acronym"], ("abbr", None));
        assert!(!DEPRECATED_ELEMENTS.contains_key("span"));
    }

    #[test]
    fn test_known_elements_union() {
        assert!(is_known("div"));
        assert!(is_known("li"));
        assert!(is_known("wbr"));
        assert!(!is_known("blink"));
        assert!(!is_known("my-widget"));
    }
}
