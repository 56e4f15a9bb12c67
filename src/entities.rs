//! Entity normalization: every literal `&` in the output of this module
//! begins either a valid, allow-listed character reference or an escaped
//! `&amp;`.
//!
//! The pass is total: malformed or unknown references degrade to escaped
//! literal text instead of erroring.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::EntityMode;

/// Matches a candidate reference after the blanket `&` → `&amp;` escape:
/// `&amp;NAME;`, `&amp;#NUM;`, or `&amp;#xHEX;`.
#[allow(clippy::expect_used)]
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&amp;(?:([A-Za-z][A-Za-z0-9]{1,31});|#(?:[xX]([0-9A-Fa-f]{1,6})|([0-9]{1,7}));)")
        .expect("ENTITY_RE regex")
});

/// Entities that always pass through unchanged, whatever the mode.
static RESERVED: [&str; 9] = ["amp", "lt", "gt", "quot", "AMP", "LT", "GT", "QUOT", "apos"];

/// Builtin named character references: the full HTML4 set plus `apos`.
pub static NAMED_ENTITIES: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    [
        // Markup-significant and internationalization
        ("quot", 34), ("amp", 38), ("apos", 39), ("lt", 60), ("gt", 62),
        ("OElig", 338), ("oelig", 339), ("Scaron", 352), ("scaron", 353),
        ("Yuml", 376), ("circ", 710), ("tilde", 732), ("ensp", 8194),
        ("emsp", 8195), ("thinsp", 8201), ("zwnj", 8204), ("zwj", 8205),
        ("lrm", 8206), ("rlm", 8207), ("ndash", 8211), ("mdash", 8212),
        ("lsquo", 8216), ("rsquo", 8217), ("sbquo", 8218), ("ldquo", 8220),
        ("rdquo", 8221), ("bdquo", 8222), ("dagger", 8224), ("Dagger", 8225),
        ("permil", 8240), ("lsaquo", 8249), ("rsaquo", 8250), ("euro", 8364),
        // Latin-1
        ("nbsp", 160), ("iexcl", 161), ("cent", 162), ("pound", 163),
        ("curren", 164), ("yen", 165), ("brvbar", 166), ("sect", 167),
        ("uml", 168), ("copy", 169), ("ordf", 170), ("laquo", 171),
        ("not", 172), ("shy", 173), ("reg", 174), ("macr", 175),
        ("deg", 176), ("plusmn", 177), ("sup2", 178), ("sup3", 179),
        ("acute", 180), ("micro", 181), ("para", 182), ("middot", 183),
        ("cedil", 184), ("sup1", 185), ("ordm", 186), ("raquo", 187),
        ("frac14", 188), ("frac12", 189), ("frac34", 190), ("iquest", 191),
        ("Agrave", 192), ("Aacute", 193), ("Acirc", 194), ("Atilde", 195),
        ("Auml", 196), ("Aring", 197), ("AElig", 198), ("Ccedil", 199),
        ("Egrave", 200), ("Eacute", 201), ("Ecirc", 202), ("Euml", 203),
        ("Igrave", 204), ("Iacute", 205), ("Icirc", 206), ("Iuml", 207),
        ("ETH", 208), ("Ntilde", 209), ("Ograve", 210), ("Oacute", 211),
        ("Ocirc", 212), ("Otilde", 213), ("Ouml", 214), ("times", 215),
        ("Oslash", 216), ("Ugrave", 217), ("Uacute", 218), ("Ucirc", 219),
        ("Uuml", 220), ("Yacute", 221), ("THORN", 222), ("szlig", 223),
        ("agrave", 224), ("aacute", 225), ("acirc", 226), ("atilde", 227),
        ("auml", 228), ("aring", 229), ("aelig", 230), ("ccedil", 231),
        ("egrave", 232), ("eacute", 233), ("ecirc", 234), ("euml", 235),
        ("igrave", 236), ("iacute", 237), ("icirc", 238), ("iuml", 239),
        ("eth", 240), ("ntilde", 241), ("ograve", 242), ("oacute", 243),
        ("ocirc", 244), ("otilde", 245), ("ouml", 246), ("divide", 247),
        ("oslash", 248), ("ugrave", 249), ("uacute", 250), ("ucirc", 251),
        ("uuml", 252), ("yacute", 253), ("thorn", 254), ("yuml", 255),
        // Greek
        ("fnof", 402), ("Alpha", 913), ("Beta", 914), ("Gamma", 915),
        ("Delta", 916), ("Epsilon", 917), ("Zeta", 918), ("Eta", 919),
        ("Theta", 920), ("Iota", 921), ("Kappa", 922), ("Lambda", 923),
        ("Mu", 924), ("Nu", 925), ("Xi", 926), ("Omicron", 927),
        ("Pi", 928), ("Rho", 929), ("Sigma", 931), ("Tau", 932),
        ("Upsilon", 933), ("Phi", 934), ("Chi", 935), ("Psi", 936),
        ("Omega", 937), ("alpha", 945), ("beta", 946), ("gamma", 947),
        ("delta", 948), ("epsilon", 949), ("zeta", 950), ("eta", 951),
        ("theta", 952), ("iota", 953), ("kappa", 954), ("lambda", 955),
        ("mu", 956), ("nu", 957), ("xi", 958), ("omicron", 959),
        ("pi", 960), ("rho", 961), ("sigmaf", 962), ("sigma", 963),
        ("tau", 964), ("upsilon", 965), ("phi", 966), ("chi", 967),
        ("psi", 968), ("omega", 969), ("thetasym", 977), ("upsih", 978),
        ("piv", 982),
        // General punctuation, letterlike, arrows
        ("bull", 8226), ("hellip", 8230), ("prime", 8242), ("Prime", 8243),
        ("oline", 8254), ("frasl", 8260), ("weierp", 8472), ("image", 8465),
        ("real", 8476), ("trade", 8482), ("alefsym", 8501), ("larr", 8592),
        ("uarr", 8593), ("rarr", 8594), ("darr", 8595), ("harr", 8596),
        ("crarr", 8629), ("lArr", 8656), ("uArr", 8657), ("rArr", 8658),
        ("dArr", 8659), ("hArr", 8660),
        // Mathematical operators
        ("forall", 8704), ("part", 8706), ("exist", 8707), ("empty", 8709),
        ("nabla", 8711), ("isin", 8712), ("notin", 8713), ("ni", 8715),
        ("prod", 8719), ("sum", 8721), ("minus", 8722), ("lowast", 8727),
        ("radic", 8730), ("prop", 8733), ("infin", 8734), ("ang", 8736),
        ("and", 8743), ("or", 8744), ("cap", 8745), ("cup", 8746),
        ("int", 8747), ("there4", 8756), ("sim", 8764), ("cong", 8773),
        ("asymp", 8776), ("ne", 8800), ("equiv", 8801), ("le", 8804),
        ("ge", 8805), ("sub", 8834), ("sup", 8835), ("nsub", 8836),
        ("sube", 8838), ("supe", 8839), ("oplus", 8853), ("otimes", 8855),
        ("perp", 8869), ("sdot", 8901),
        // Technical and geometric
        ("lceil", 8968), ("rceil", 8969), ("lfloor", 8970), ("rfloor", 8971),
        ("lang", 9001), ("rang", 9002), ("loz", 9674), ("spades", 9824),
        ("clubs", 9827), ("hearts", 9829), ("diams", 9830),
    ]
    .into_iter()
    .collect()
});

/// Check if a code point is a legal Unicode scalar for character data:
/// rejects C0/C1 controls (except tab, lf, cr), the surrogate range,
/// noncharacters, and anything past the last plane.
#[must_use]
pub fn is_valid_scalar(cp: u32) -> bool {
    match cp {
        9 | 10 | 13 => true,
        0..=31 | 127..=159 => false,
        0xD800..=0xDFFF => false,
        0xFDD0..=0xFDEF => false,
        _ if cp > 0x0010_FFFF => false,
        _ if cp & 0xFFFE == 0xFFFE => false,
        _ => true,
    }
}

/// Normalize every `&` in `text` so it begins a valid reference or `&amp;`.
///
/// First double-encodes all literal ampersands, then rescues the sequences
/// that form syntactically valid references: named references present in
/// `NAMED_ENTITIES` are re-encoded per `mode`, numeric references are
/// validated against the legal scalar ranges and canonicalized, and the
/// reserved entities pass through untouched. Everything else stays escaped.
#[must_use]
pub fn normalize(text: &str, mode: EntityMode) -> String {
    let escaped = text.replace('&', "&amp;");
    ENTITY_RE
        .replace_all(&escaped, |caps: &Captures| rescue(caps, mode))
        .into_owned()
}

fn rescue(caps: &Captures, mode: EntityMode) -> String {
    if let Some(name) = caps.get(1).map(|m| m.as_str()) {
        if RESERVED.contains(&name) {
            return format!("&{name};");
        }
        return match NAMED_ENTITIES.get(name) {
            Some(&cp) => match mode {
                EntityMode::Named => format!("&{name};"),
                EntityMode::Decimal => format!("&#{cp};"),
                EntityMode::Hex => format!("&#x{cp:X};"),
            },
            // Unknown name: leave the ampersand escaped.
            None => caps[0].to_string(),
        };
    }

    let cp = caps
        .get(2)
        .and_then(|m| u32::from_str_radix(m.as_str(), 16).ok())
        .or_else(|| caps.get(3).and_then(|m| m.as_str().parse().ok()));

    match cp {
        Some(cp) if is_valid_scalar(cp) => match mode {
            EntityMode::Hex => format!("&#x{cp:X};"),
            EntityMode::Named | EntityMode::Decimal => format!("&#{cp};"),
        },
        // Out-of-range or unparseable: reject back to escaped literal.
        _ => caps[0].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ampersand_is_escaped() {
        assert_eq!(normalize("fish & chips", EntityMode::Named), "fish &amp; chips");
    }

    #[test]
    fn reserved_entities_pass_through() {
        assert_eq!(normalize("&amp; &lt; &gt; &quot;", EntityMode::Decimal), "&amp; &lt; &gt; &quot;");
        assert_eq!(normalize("&AMP; &LT;", EntityMode::Hex), "&AMP; &LT;");
    }

    #[test]
    fn known_named_entity_kept_in_named_mode() {
        assert_eq!(normalize("caf&eacute;", EntityMode::Named), "caf&eacute;");
    }

    #[test]
    fn known_named_entity_forced_decimal() {
        assert_eq!(normalize("caf&eacute;", EntityMode::Decimal), "caf&#233;");
        assert_eq!(normalize("&nbsp;", EntityMode::Decimal), "&#160;");
    }

    #[test]
    fn known_named_entity_forced_hex() {
        assert_eq!(normalize("caf&eacute;", EntityMode::Hex), "caf&#xE9;");
    }

    #[test]
    fn unknown_name_degrades_to_escaped_literal() {
        assert_eq!(normalize("&bogus;", EntityMode::Named), "&amp;bogus;");
    }

    #[test]
    fn entity_names_are_case_sensitive() {
        assert_eq!(normalize("&Auml;", EntityMode::Decimal), "&#196;");
        assert_eq!(normalize("&AUML;", EntityMode::Decimal), "&amp;AUML;");
    }

    #[test]
    fn numeric_reference_canonicalized() {
        assert_eq!(normalize("&#0233;", EntityMode::Decimal), "&#233;");
        assert_eq!(normalize("&#xe9;", EntityMode::Hex), "&#xE9;");
        assert_eq!(normalize("&#xE9;", EntityMode::Decimal), "&#233;");
    }

    #[test]
    fn control_and_surrogate_references_rejected() {
        assert_eq!(normalize("&#0;", EntityMode::Named), "&amp;#0;");
        assert_eq!(normalize("&#8;", EntityMode::Named), "&amp;#8;");
        assert_eq!(normalize("&#x1F;", EntityMode::Named), "&amp;#x1F;");
        assert_eq!(normalize("&#xD800;", EntityMode::Named), "&amp;#xD800;");
        assert_eq!(normalize("&#xFFFF;", EntityMode::Named), "&amp;#xFFFF;");
        assert_eq!(normalize("&#1114112;", EntityMode::Named), "&amp;#1114112;");
    }

    #[test]
    fn tab_and_newline_references_allowed() {
        assert_eq!(normalize("&#9;", EntityMode::Decimal), "&#9;");
        assert_eq!(normalize("&#10;", EntityMode::Decimal), "&#10;");
    }

    #[test]
    fn truncated_reference_stays_escaped() {
        assert_eq!(normalize("&eacute", EntityMode::Named), "&amp;eacute");
        assert_eq!(normalize("&#12", EntityMode::Named), "&amp;#12");
    }

    #[test]
    fn idempotent_over_own_output() {
        let once = normalize("a & b &copy; &#200; &bogus;", EntityMode::Named);
        let twice = normalize(&once, EntityMode::Named);
        assert_eq!(once, twice);
    }
}
