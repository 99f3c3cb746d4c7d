//! Compound selector parsing and matching.
//!
//! Supports the subset a clamp set needs to discover elements: tag names,
//! `#id`, `.class`, the universal `*`, compounds of those (`p.teaser#intro`),
//! and comma-separated groups. Combinators (descendant, child) are not
//! supported; a selector using them matches nothing.

use std::collections::HashMap;

// =============================================================================
// TYPES
// =============================================================================

/// A parsed selector: one or more compounds, any of which may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

/// One compound: every present part must match the same element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Parse one compound. Returns `None` for anything outside the supported
/// grammar, which makes the compound match nothing.
fn parse_compound(input: &str) -> Option<Compound> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input == "*" {
        return Some(Compound::default());
    }

    let mut compound = Compound::default();
    let mut chars = input.chars().peekable();

    // Optional leading tag name.
    if chars.peek().copied().is_some_and(is_name_char) {
        let mut tag = String::new();
        while chars.peek().copied().is_some_and(is_name_char) {
            tag.push(chars.next().unwrap());
        }
        compound.tag = Some(tag);
    }

    // Any number of #id / .class parts.
    while let Some(marker) = chars.next() {
        let mut name = String::new();
        while chars.peek().copied().is_some_and(is_name_char) {
            name.push(chars.next().unwrap());
        }
        if name.is_empty() {
            return None;
        }
        match marker {
            '#' => compound.id = Some(name),
            '.' => compound.classes.push(name),
            _ => return None,
        }
    }

    Some(compound)
}

impl Selector {
    /// Parse a selector expression.
    ///
    /// Parsing never fails; unsupported syntax produces a selector that
    /// matches nothing (and logs a warning), so discovery quietly finds no
    /// elements rather than panicking inside an observer callback.
    pub fn parse(input: &str) -> Self {
        let compounds: Vec<Compound> = input
            .split(',')
            .filter_map(parse_compound)
            .collect();

        #[cfg(feature = "tracing")]
        if compounds.is_empty() {
            tracing::warn!(selector = input, "selector matches nothing");
        }

        Self { compounds }
    }

    /// Match against raw element data: tag name plus the attribute map
    /// (`id` and whitespace-separated `class` are read from it).
    pub fn matches_parts(&self, tag: &str, attributes: &HashMap<String, String>) -> bool {
        self.compounds
            .iter()
            .any(|compound| compound.matches(tag, attributes))
    }
}

impl Compound {
    fn matches(&self, tag: &str, attributes: &HashMap<String, String>) -> bool {
        if let Some(want) = &self.tag {
            if want != tag {
                return false;
            }
        }

        if let Some(want) = &self.id {
            match attributes.get("id") {
                Some(id) if id == want => {}
                _ => return false,
            }
        }

        if !self.classes.is_empty() {
            let Some(class_attr) = attributes.get("class") else {
                return false;
            };
            let declared: Vec<&str> = class_attr.split_whitespace().collect();
            if !self
                .classes
                .iter()
                .all(|class| declared.contains(&class.as_str()))
            {
                return false;
            }
        }

        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tag_selector() {
        let sel = Selector::parse("p");
        assert!(sel.matches_parts("p", &attrs(&[])));
        assert!(!sel.matches_parts("div", &attrs(&[])));
    }

    #[test]
    fn test_universal_selector() {
        let sel = Selector::parse("*");
        assert!(sel.matches_parts("p", &attrs(&[])));
        assert!(sel.matches_parts("section", &attrs(&[("class", "x")])));
    }

    #[test]
    fn test_id_selector() {
        let sel = Selector::parse("#intro");
        assert!(sel.matches_parts("p", &attrs(&[("id", "intro")])));
        assert!(!sel.matches_parts("p", &attrs(&[("id", "other")])));
        assert!(!sel.matches_parts("p", &attrs(&[])));
    }

    #[test]
    fn test_class_selector() {
        let sel = Selector::parse(".teaser");
        assert!(sel.matches_parts("p", &attrs(&[("class", "teaser")])));
        assert!(sel.matches_parts("p", &attrs(&[("class", "card teaser wide")])));
        assert!(!sel.matches_parts("p", &attrs(&[("class", "teasers")])));
        assert!(!sel.matches_parts("p", &attrs(&[])));
    }

    #[test]
    fn test_compound_selector() {
        let sel = Selector::parse("p.teaser#intro");
        let good = attrs(&[("class", "teaser"), ("id", "intro")]);
        assert!(sel.matches_parts("p", &good));
        assert!(!sel.matches_parts("div", &good));
        assert!(!sel.matches_parts("p", &attrs(&[("class", "teaser")])));
    }

    #[test]
    fn test_multiple_classes_all_required() {
        let sel = Selector::parse(".a.b");
        assert!(sel.matches_parts("p", &attrs(&[("class", "b a")])));
        assert!(!sel.matches_parts("p", &attrs(&[("class", "a")])));
    }

    #[test]
    fn test_selector_groups() {
        let sel = Selector::parse("p, .teaser");
        assert!(sel.matches_parts("p", &attrs(&[])));
        assert!(sel.matches_parts("div", &attrs(&[("class", "teaser")])));
        assert!(!sel.matches_parts("div", &attrs(&[])));
    }

    #[test]
    fn test_unsupported_syntax_matches_nothing() {
        assert!(!Selector::parse("div p").matches_parts("p", &attrs(&[])));
        assert!(!Selector::parse("").matches_parts("p", &attrs(&[])));
        assert!(!Selector::parse("#").matches_parts("p", &attrs(&[])));
    }

    #[test]
    fn test_hyphenated_names() {
        let sel = Selector::parse("news-item.card-body");
        assert!(sel.matches_parts(
            "news-item",
            &attrs(&[("class", "card-body")])
        ));
    }
}
