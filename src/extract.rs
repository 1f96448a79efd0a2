//! Per-page element extraction.
//!
//! Walks one page's DOM in document order and emits a flat list of typed
//! [`ContentElement`]s: classified text, images and end-of-article markers.
//! Role matching goes through selectors compiled once per load from the
//! [`StyleClassification`].

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{Role, StyleClassification, is_inline_override};
use crate::config::MarkerConfig;
use crate::dom::{ArenaDom, ArenaNodeId, PropertyValue, SelectorSet, parse_inline_style};
use crate::error::Error;
use crate::loader::PageDocument;
use crate::util::collapse_whitespace;

/// Block-level wrappers that never carry a text role of their own for the
/// sidebar and body roles.
pub const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "article", "aside", "main", "header", "footer", "body", "figure",
];

/// Role priority when an element matches several roles.
const PRIORITY: &[(Role, bool)] = &[
    (Role::ArticleBoundary, false),
    (Role::Question, false),
    (Role::Subheading, false),
    (Role::Streamer, false),
    (Role::Sidebar, true),
    (Role::Caption, false),
    (Role::Title, false),
    (Role::Chapeau, false),
    (Role::Body, true),
    (Role::AuthorBio, false),
    (Role::Author, false),
    (Role::Category, false),
    (Role::IntroVerse, false),
    (Role::VerseReference, false),
];

/// What an extracted element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Title,
    Chapeau,
    Body,
    Author,
    Category,
    Subheading,
    Streamer,
    Sidebar,
    Caption,
    CoverTitle,
    CoverChapeau,
    IntroVerse,
    VerseReference,
    AuthorBio,
    Question,
    Image,
    ArticleEnd,
}

impl From<Role> for ElementKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Title => ElementKind::Title,
            Role::Chapeau => ElementKind::Chapeau,
            Role::Body => ElementKind::Body,
            Role::Author => ElementKind::Author,
            Role::Category => ElementKind::Category,
            Role::Subheading => ElementKind::Subheading,
            Role::Streamer => ElementKind::Streamer,
            Role::Sidebar => ElementKind::Sidebar,
            Role::Caption => ElementKind::Caption,
            Role::CoverTitle => ElementKind::CoverTitle,
            Role::CoverChapeau => ElementKind::CoverChapeau,
            Role::IntroVerse => ElementKind::IntroVerse,
            Role::VerseReference => ElementKind::VerseReference,
            Role::AuthorBio => ElementKind::AuthorBio,
            Role::Question => ElementKind::Question,
            Role::ArticleBoundary => ElementKind::ArticleEnd,
        }
    }
}

/// Vertical extent of an element on its page, in export units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerticalRange {
    pub top: f32,
    pub bottom: f32,
}

/// One extracted unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentElement {
    pub kind: ElementKind,
    /// Plain text; `<br>` line breaks are kept as `\n`.
    pub text: String,
    pub markup: String,
    /// The class that gave the element its role.
    pub class_name: Option<String>,
    pub page_index: u32,
    pub page_start: u32,
    pub page_end: u32,
    pub position: Option<VerticalRange>,
    /// Dominant inline override class inside the element.
    pub emphasis: Option<String>,
    /// Referenced filename, for images.
    pub image: Option<String>,
}

impl ContentElement {
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            markup: String::new(),
            class_name: None,
            page_index: 0,
            page_start: 1,
            page_end: 1,
            position: None,
            emphasis: None,
            image: None,
        }
    }

    pub fn image(filename: impl Into<String>) -> Self {
        let mut element = Self::new(ElementKind::Image, "");
        element.image = Some(filename.into());
        element
    }

    pub fn article_end() -> Self {
        Self::new(ElementKind::ArticleEnd, "")
    }

    /// Place the element on a page (printed numbering follows the index).
    pub fn on_page(mut self, index: u32) -> Self {
        self.page_index = index;
        self.page_start = index + 1;
        self.page_end = index + 1;
        self
    }

    pub fn at(mut self, top: f32, bottom: f32) -> Self {
        self.position = Some(VerticalRange { top, bottom });
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_name = Some(class.into());
        self
    }

    pub fn with_emphasis(mut self, class: impl Into<String>) -> Self {
        self.emphasis = Some(class.into());
        self
    }

    fn located(mut self, page: &PageDocument) -> Self {
        self.page_index = page.index;
        self.page_start = page.page_start;
        self.page_end = page.page_end;
        self
    }
}

/// Compiled role selectors plus the settings the walk needs.
#[derive(Debug)]
pub struct Extractor<'a> {
    classification: &'a StyleClassification,
    selectors: Vec<(Role, SelectorSet)>,
    cover_titles: SelectorSet,
    end_glyph: String,
}

impl<'a> Extractor<'a> {
    /// Compile selectors for every classified role. Classes whose selector
    /// fails to compile are reported and left out.
    pub fn new(classification: &'a StyleClassification, markers: &MarkerConfig) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut compile = |role: Role, container_excluded: bool| {
            let mut set = SelectorSet::default();
            for class in classification.classes_for(role) {
                let compiled = if container_excluded {
                    SelectorSet::for_class_excluding(class, CONTAINER_TAGS)
                } else {
                    SelectorSet::for_class(class)
                };
                match compiled {
                    Some(compiled) => set.extend(compiled),
                    None => {
                        let error = Error::Selector {
                            class: class.to_string(),
                        };
                        warn!("{error}");
                        warnings.push(error.to_string());
                    }
                }
            }
            set
        };

        let selectors = PRIORITY
            .iter()
            .map(|&(role, excluded)| (role, compile(role, excluded)))
            .filter(|(_, set)| !set.is_empty())
            .collect();
        let cover_titles = compile(Role::CoverTitle, false);

        let extractor = Self {
            classification,
            selectors,
            cover_titles,
            end_glyph: markers.end_glyph.clone(),
        };
        (extractor, warnings)
    }

    fn role_of(&self, dom: &ArenaDom, id: ArenaNodeId) -> Option<Role> {
        if dom.element_classes(id).is_empty() {
            return None;
        }
        self.selectors
            .iter()
            .find(|(_, set)| set.matches(dom, id))
            .map(|(role, _)| *role)
    }

    fn has_marker(&self, dom: &ArenaDom, id: ArenaNodeId) -> bool {
        !self.end_glyph.is_empty() && dom.direct_text(id).contains(self.end_glyph.as_str())
    }

    /// Extract every content element of a page in document order.
    pub fn extract_page(&self, page: &PageDocument) -> Vec<ContentElement> {
        let mut out = Vec::new();
        self.walk(page, page.dom.document(), false, &mut out);
        debug!(page = page.index, elements = out.len(), "extracted page");
        out
    }

    fn walk(&self, page: &PageDocument, parent: ArenaNodeId, emitted: bool, out: &mut Vec<ContentElement>) {
        let dom = &page.dom;
        for id in dom.element_children(parent) {
            if dom.has_tag(id, "img") {
                if let Some(filename) = dom.get_attr(id, "src").and_then(image_filename) {
                    out.push(ContentElement::image(filename).located(page));
                }
                continue;
            }

            let marker = self.has_marker(dom, id);
            if emitted {
                if marker {
                    out.push(ContentElement::article_end().located(page));
                }
                self.walk(page, id, true, out);
                continue;
            }

            match self.role_of(dom, id) {
                Some(Role::ArticleBoundary) => {
                    out.push(ContentElement::article_end().located(page));
                    self.walk(page, id, true, out);
                }
                Some(role) => {
                    let text = clean_text(&dom.collect_text(id), &self.end_glyph);
                    if !text.is_empty() {
                        out.push(self.text_element(page, id, role, text));
                    }
                    if marker {
                        out.push(ContentElement::article_end().located(page));
                    }
                    self.walk(page, id, true, out);
                }
                None => {
                    if marker {
                        out.push(ContentElement::article_end().located(page));
                    }
                    self.walk(page, id, false, out);
                }
            }
        }
    }

    fn text_element(&self, page: &PageDocument, id: ArenaNodeId, role: Role, text: String) -> ContentElement {
        let dom = &page.dom;
        let mut element = ContentElement::new(role.into(), text).located(page);
        element.markup = dom.inner_html(id);
        element.class_name = self
            .classification
            .class_with_role(dom.element_classes(id), role)
            .map(str::to_string);
        element.position = vertical_range(dom, id);
        element.emphasis = dominant_override(dom, id);
        element
    }

    /// Text of the first cover-title element on a page.
    pub fn cover_headline(&self, page: &PageDocument) -> Option<String> {
        let dom = &page.dom;
        dom.descendants(dom.document())
            .filter(|&id| self.cover_titles.matches(dom, id))
            .map(|id| clean_text(&dom.collect_text(id), &self.end_glyph).replace('\n', " "))
            .find(|text| !text.is_empty())
    }
}

/// Remove the end glyph and normalize whitespace line by line.
fn clean_text(raw: &str, glyph: &str) -> String {
    let stripped = if glyph.is_empty() {
        raw.to_string()
    } else {
        raw.replace(glyph, "")
    };
    stripped
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Basename of an `img` source, percent-decoded.
fn image_filename(src: &str) -> Option<String> {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let name = path.rsplit('/').next()?;
    if name.is_empty() {
        return None;
    }
    Some(percent_decode_str(name).decode_utf8_lossy().into_owned())
}

/// Vertical range from an inline style. `top` wins over a translate offset.
fn style_range(dom: &ArenaDom, id: ArenaNodeId) -> Option<VerticalRange> {
    let style = dom.get_attr(id, "style")?;
    let mut top = None;
    let mut translate_y = None;
    let mut height = None;
    for decl in parse_inline_style(style) {
        match (decl.property.as_str(), &decl.value) {
            ("top", PropertyValue::Px(v)) => top = Some(*v),
            ("height", PropertyValue::Px(v)) => height = Some(*v),
            ("transform", PropertyValue::Translate { y, .. }) => translate_y = Some(*y),
            _ => {}
        }
    }
    let top = top.or(translate_y)?;
    Some(VerticalRange {
        top,
        bottom: top + height.unwrap_or(0.0),
    })
}

/// The element's own range, or its parent's when that parent positions only
/// this element.
fn vertical_range(dom: &ArenaDom, id: ArenaNodeId) -> Option<VerticalRange> {
    style_range(dom, id).or_else(|| {
        let parent = dom.parent(id)?;
        if dom.element_children(parent).count() == 1 {
            style_range(dom, parent)
        } else {
            None
        }
    })
}

/// The inline override class covering the most text inside an element, if
/// it covers more than half of it.
fn dominant_override(dom: &ArenaDom, id: ArenaNodeId) -> Option<String> {
    let total = visible_len(&dom.collect_text(id));
    let mut weights: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for node in std::iter::once(id).chain(dom.descendants(id)) {
        for class in dom.element_classes(node) {
            if is_inline_override(class) {
                let weight = visible_len(&dom.collect_text(node));
                if !weights.contains_key(class.as_str()) {
                    order.push(class.as_str());
                }
                *weights.entry(class.as_str()).or_default() += weight;
            }
        }
    }
    // Ties go to the first class seen
    order
        .into_iter()
        .fold(None::<(&str, usize)>, |best, class| {
            let weight = weights[class];
            match best {
                Some((_, w)) if w >= weight => best,
                _ => Some((class, weight)),
            }
        })
        .filter(|(_, weight)| *weight > 0 && weight * 2 > total)
        .map(|(class, _)| class.to_string())
}

fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
