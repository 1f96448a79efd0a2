//! Page markup parsing and selector matching.
//!
//! Each exported page is parsed with html5ever into an [`ArenaDom`]. Role
//! selectors are compiled once per load into a [`SelectorSet`] and matched
//! against arena nodes through [`ElementRef`].

mod arena;
mod css;
mod element_ref;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId};
pub use css::{Declaration, DeclaredRule, PropertyValue, parse_inline_style, scan_stylesheet};
pub use element_ref::{ElementRef, PageSelectors};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::parser::Selector;

use tree_sink::ArenaSink;

/// Parse one page of markup into an arena DOM.
pub fn parse_html(html: &str) -> ArenaDom {
    let sink = ArenaSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// A compiled list of selectors, matched as a union.
#[derive(Debug, Clone, Default)]
pub struct SelectorSet {
    selectors: Vec<Selector<PageSelectors>>,
}

impl SelectorSet {
    /// Compile a comma-separated selector list. Returns `None` when the
    /// list does not parse.
    pub fn parse(source: &str) -> Option<Self> {
        let mut input = cssparser::ParserInput::new(source);
        let mut parser = cssparser::Parser::new(&mut input);
        let list = selectors::parser::SelectorList::parse(
            &PageSelectors,
            &mut parser,
            selectors::parser::ParseRelative::No,
        )
        .ok()?;
        Some(Self {
            selectors: list.slice().to_vec(),
        })
    }

    /// Build the selector for `class` on any tag.
    pub fn for_class(class: &str) -> Option<Self> {
        Self::for_class_excluding(class, &[])
    }

    /// Build the selector for `class` on any tag except `excluded`.
    pub fn for_class_excluding(class: &str, excluded: &[&str]) -> Option<Self> {
        let mut source = String::from(".");
        cssparser::serialize_identifier(class, &mut source).ok()?;
        if !excluded.is_empty() {
            source.push_str(&format!(":not({})", excluded.join(", ")));
        }
        Self::parse(&source)
    }

    /// Add every selector of `other` to this set.
    pub fn extend(&mut self, other: SelectorSet) {
        self.selectors.extend(other.selectors);
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Check whether any selector in the set matches the element.
    pub fn matches(&self, dom: &ArenaDom, id: ArenaNodeId) -> bool {
        if self.selectors.is_empty() || !dom.is_element(id) {
            return false;
        }

        let elem = ElementRef::new(dom, id);
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );

        self.selectors.iter().any(|selector| {
            selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_selector_matches() {
        let dom = parse_html(r#"<p class="Platte-tekst ParaOverride-1">Tekst</p>"#);
        let p = dom.find_by_tag("p").unwrap();

        let set = SelectorSet::for_class("Platte-tekst").unwrap();
        assert!(set.matches(&dom, p));

        let set = SelectorSet::for_class("Titel").unwrap();
        assert!(!set.matches(&dom, p));
    }

    #[test]
    fn test_excluded_tags() {
        let dom = parse_html(r#"<div class="Kader"><p class="Kader">In kader</p></div>"#);
        let div = dom.find_by_tag("div").unwrap();
        let p = dom.find_by_tag("p").unwrap();

        let set = SelectorSet::for_class_excluding("Kader", &["div", "section"]).unwrap();
        assert!(set.matches(&dom, p));
        assert!(!set.matches(&dom, div));
    }

    #[test]
    fn test_escaped_class_name() {
        let dom = parse_html(r#"<p class="1e-kop">Kop</p>"#);
        let p = dom.find_by_tag("p").unwrap();

        let set = SelectorSet::for_class("1e-kop").unwrap();
        assert!(set.matches(&dom, p));
    }

    #[test]
    fn test_descendant_selector() {
        let dom = parse_html("<div><span><p>Hello</p></span></div>");
        let p = dom.find_by_tag("p").unwrap();

        assert!(SelectorSet::parse("div p").unwrap().matches(&dom, p));
        assert!(!SelectorSet::parse("div > p").unwrap().matches(&dom, p));
    }
}
