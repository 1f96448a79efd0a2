//! Article assembly.
//!
//! [`build_article`] turns one sealed [`ArticleGroup`] into an [`Article`]:
//! heading fields, reflowed body, authors, images and captions.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::boundary::ArticleGroup;
use crate::config::{AuthorConfig, Config};
use crate::error::{Error, Result};
use crate::extract::{ContentElement, ElementKind};
use crate::merge::{BlockKind, BodyBlock, dominant_emphasis, merge_paragraphs};
use crate::util::{collapse_whitespace, escape_html, normalize_key};

/// Class-name keywords that mark a title element as a subtitle.
const SUBTITLE_KEYWORDS: &[&str] = &["sub", "onder"];

/// A reconstructed article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: String,
    pub subtitle: Option<String>,
    pub lifespan: Option<String>,
    pub chapeau: String,
    pub verse_reference: Option<String>,
    pub author_bio: Option<String>,
    pub blocks: Vec<BodyBlock>,
    /// Body rendered as HTML.
    pub content: String,
    pub category: Option<String>,
    pub page_start: u32,
    pub page_end: u32,
    pub source_pages: BTreeSet<u32>,
    pub authors: Vec<String>,
    /// Images placed right after an author line, in document order.
    pub author_photos: Vec<String>,
    pub images: Vec<String>,
    /// Image filename to caption.
    pub captions: BTreeMap<String, String>,
}

/// Assemble an article from its group.
pub fn build_article(group: &ArticleGroup, config: &Config) -> Result<Article> {
    let elements = group.elements.as_slice();
    let obituary = group.obituary.as_ref();

    let (page_start, page_end) = page_span(elements).ok_or(Error::Untitled { page: 0 })?;
    let untitled = || Error::Untitled { page: page_start };

    let obituary_texts: Vec<&str> = obituary
        .map(|o| {
            std::iter::once(o.category.as_str())
                .chain(o.name.as_deref())
                .chain(o.lifespan.as_deref())
                .collect()
        })
        .unwrap_or_default();
    let (subtitles, titles): (Vec<&ContentElement>, Vec<&ContentElement>) = elements
        .iter()
        .filter(|e| e.kind == ElementKind::Title && !obituary_texts.contains(&e.text.as_str()))
        .partition(|e| is_subtitle_class(e.class_name.as_deref()));

    let title = match obituary.and_then(|o| o.name.clone()) {
        Some(name) => name,
        None if !titles.is_empty() => join_texts(titles.iter().copied(), " "),
        None if !subtitles.is_empty() => join_texts(subtitles.iter().copied(), " "),
        None => obituary.map(|o| o.category.clone()).ok_or_else(untitled)?,
    };
    let subtitle = (!titles.is_empty() && !subtitles.is_empty())
        .then(|| join_texts(subtitles.iter().copied(), " "));

    let dominant = dominant_emphasis(elements);
    let blocks = merge_paragraphs(elements, dominant.as_deref(), &config.merge);

    let chapeau = joined(elements, ElementKind::Chapeau, " ")
        .or_else(|| joined(elements, ElementKind::IntroVerse, "\n"))
        .or_else(|| {
            blocks
                .iter()
                .find(|b| b.kind == BlockKind::Intro)
                .map(|b| b.text.clone())
        })
        .unwrap_or_default();

    let category = obituary
        .map(|o| o.category.clone())
        .or_else(|| {
            elements
                .iter()
                .find(|e| e.kind == ElementKind::Category)
                .map(|e| e.text.clone())
        })
        .or_else(|| category_from_class(&titles, config));

    let authors = parse_authors(
        elements
            .iter()
            .filter(|e| e.kind == ElementKind::Author)
            .map(|e| e.text.as_str()),
        &config.authors,
    );

    let window = config.association.window;
    let mut images = Vec::new();
    let mut author_photos = Vec::new();
    for (i, element) in elements.iter().enumerate() {
        let Some(filename) = element.image.as_ref() else {
            continue;
        };
        if !images.contains(filename) {
            images.push(filename.clone());
        }
        let after_author = nearest_preceding(elements, i, window, |e| {
            matches!(e.kind, ElementKind::Author | ElementKind::AuthorBio)
        });
        if after_author.is_some() && !author_photos.contains(filename) {
            author_photos.push(filename.clone());
        }
    }

    let is_image = |e: &ContentElement| e.kind == ElementKind::Image && e.image.is_some();
    let mut captions = BTreeMap::new();
    for (i, element) in elements.iter().enumerate() {
        if element.kind != ElementKind::Caption {
            continue;
        }
        let anchor = nearest_preceding(elements, i, window, is_image)
            .or_else(|| nearest_following(elements, i, window, is_image));
        if let Some(filename) = anchor.and_then(|j| elements[j].image.clone()) {
            captions.entry(filename).or_insert_with(|| element.text.clone());
        }
    }

    let article = Article {
        title,
        subtitle,
        lifespan: obituary.and_then(|o| o.lifespan.clone()),
        chapeau,
        verse_reference: joined(elements, ElementKind::VerseReference, " "),
        author_bio: joined(elements, ElementKind::AuthorBio, " "),
        content: render_content(&blocks),
        blocks,
        category,
        page_start,
        page_end,
        source_pages: elements.iter().map(|e| e.page_index).collect(),
        authors,
        author_photos,
        images,
        captions,
    };
    debug!(
        title = %article.title,
        blocks = article.blocks.len(),
        pages = ?(article.page_start, article.page_end),
        "built article"
    );
    Ok(article)
}

fn page_span(elements: &[ContentElement]) -> Option<(u32, u32)> {
    let start = elements.iter().map(|e| e.page_start).min()?;
    let end = elements.iter().map(|e| e.page_end).max()?;
    Some((start, end))
}

fn is_subtitle_class(class: Option<&str>) -> bool {
    class.is_some_and(|c| {
        let lowered = c.to_lowercase();
        SUBTITLE_KEYWORDS.iter().any(|k| lowered.contains(k))
    })
}

fn join_texts<'a>(elements: impl Iterator<Item = &'a ContentElement>, separator: &str) -> String {
    elements
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Texts of every element of `kind` joined, or `None` when there are none.
fn joined(elements: &[ContentElement], kind: ElementKind, separator: &str) -> Option<String> {
    let text = join_texts(elements.iter().filter(|e| e.kind == kind), separator);
    (!text.is_empty()).then_some(text)
}

fn category_from_class(titles: &[&ContentElement], config: &Config) -> Option<String> {
    titles.iter().filter_map(|e| e.class_name.as_deref()).find_map(|class| {
        let lowered = class.to_lowercase();
        config
            .categories
            .class_keywords
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, category)| category.clone())
    })
}

/// Index of the closest item before `index`, at most `window` positions
/// back, that satisfies `predicate`.
pub fn nearest_preceding<T>(
    items: &[T],
    index: usize,
    window: usize,
    predicate: impl Fn(&T) -> bool,
) -> Option<usize> {
    let start = index.saturating_sub(window);
    (start..index.min(items.len())).rev().find(|&j| predicate(&items[j]))
}

/// Index of the closest item after `index`, at most `window` positions
/// ahead, that satisfies `predicate`.
pub fn nearest_following<T>(
    items: &[T],
    index: usize,
    window: usize,
    predicate: impl Fn(&T) -> bool,
) -> Option<usize> {
    let end = index.saturating_add(window).saturating_add(1).min(items.len());
    (index + 1..end).find(|&j| predicate(&items[j]))
}

/// Turn raw credit lines into a deduplicated list of author names.
pub fn parse_authors<'a>(texts: impl IntoIterator<Item = &'a str>, config: &AuthorConfig) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for raw in texts {
        let line = collapse_whitespace(raw);
        let line = strip_credit_prefix(&line, &config.prefixes);

        for fragment in split_names(line, &config.separators) {
            let fragment = fragment.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == ';');
            if fragment.chars().count() < config.min_length {
                continue;
            }
            let key = normalize_key(fragment);
            if key.is_empty() {
                continue;
            }
            if names.iter().any(|n| normalize_key(n).contains(&key)) {
                continue;
            }
            match names.iter().position(|n| key.contains(&normalize_key(n))) {
                Some(shorter) => names[shorter] = fragment.to_string(),
                None => names.push(fragment.to_string()),
            }
        }
    }
    names
}

fn strip_credit_prefix<'a>(line: &'a str, prefixes: &[String]) -> &'a str {
    for prefix in prefixes {
        if line
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        {
            return line[prefix.len()..].trim_start();
        }
    }
    line
}

fn split_names<'a>(line: &'a str, separators: &[String]) -> Vec<&'a str> {
    let mut fragments = vec![line];
    for separator in separators {
        fragments = fragments
            .into_iter()
            .flat_map(|f| f.split(separator.as_str()))
            .collect();
    }
    fragments
}

/// Render body blocks as HTML.
pub fn render_content(blocks: &[BodyBlock]) -> String {
    let mut html = String::new();
    for block in blocks {
        let (open, close) = match block.kind {
            BlockKind::Intro => ("<p class=\"intro\">", "</p>"),
            BlockKind::Paragraph => ("<p>", "</p>"),
            BlockKind::Subheading => ("<h3>", "</h3>"),
            BlockKind::Streamer => ("<blockquote>", "</blockquote>"),
            BlockKind::Sidebar => ("<aside>", "</aside>"),
            BlockKind::Question => ("<p class=\"question\">", "</p>"),
        };
        html.push_str(open);
        if block.verse {
            let lines: Vec<String> = block.text.split('\n').map(escape_html).collect();
            html.push_str(&lines.join("<br>"));
        } else {
            html.push_str(&escape_html(&block.text.replace('\n', " ")));
        }
        html.push_str(close);
        html.push('\n');
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::ObituaryHeading;

    fn el(kind: ElementKind, text: &str) -> ContentElement {
        ContentElement::new(kind, text).on_page(1)
    }

    fn build(elements: Vec<ContentElement>) -> Result<Article> {
        build_article(
            &ArticleGroup {
                elements,
                obituary: None,
            },
            &Config::default(),
        )
    }

    #[test]
    fn test_title_and_body() {
        let article = build(vec![
            el(ElementKind::Title, "Test Article Title"),
            el(ElementKind::Body, "This is the article body."),
        ])
        .unwrap();
        assert_eq!(article.title, "Test Article Title");
        assert!(article.content.contains("article body"));
        assert_eq!(article.chapeau, "This is the article body.");
        assert_eq!((article.page_start, article.page_end), (2, 2));
        assert_eq!(article.source_pages, BTreeSet::from([1]));
    }

    #[test]
    fn test_untitled_group_fails() {
        let result = build(vec![el(ElementKind::Body, "los")]);
        assert!(matches!(result, Err(Error::Untitled { page: 2 })));
    }

    #[test]
    fn test_subtitle_split_by_class() {
        let article = build(vec![
            el(ElementKind::Title, "Hoofdkop").with_class("Titel"),
            el(ElementKind::Title, "een ondertitel").with_class("Titel-onder"),
        ])
        .unwrap();
        assert_eq!(article.title, "Hoofdkop");
        assert_eq!(article.subtitle.as_deref(), Some("een ondertitel"));
    }

    #[test]
    fn test_obituary_fields() {
        let group = ArticleGroup {
            elements: vec![
                el(ElementKind::Title, "In memoriam"),
                el(ElementKind::Title, "Jan de Vries"),
                el(ElementKind::Title, "1938–2026"),
                el(ElementKind::Body, "Hij was ouderling."),
            ],
            obituary: Some(ObituaryHeading {
                category: "In memoriam".to_string(),
                name: Some("Jan de Vries".to_string()),
                lifespan: Some("1938–2026".to_string()),
            }),
        };
        let article = build_article(&group, &Config::default()).unwrap();
        assert_eq!(article.title, "Jan de Vries");
        assert_eq!(article.category.as_deref(), Some("In memoriam"));
        assert_eq!(article.lifespan.as_deref(), Some("1938–2026"));
        assert_eq!(article.subtitle, None);
    }

    #[test]
    fn test_category_sources() {
        let explicit = build(vec![
            el(ElementKind::Category, "Column"),
            el(ElementKind::Title, "Kop").with_class("Titel-meditatie"),
        ])
        .unwrap();
        assert_eq!(explicit.category.as_deref(), Some("Column"));

        let from_class = build(vec![el(ElementKind::Title, "Kop").with_class("Titel-meditatie")]).unwrap();
        assert_eq!(from_class.category.as_deref(), Some("Meditatie"));

        let none = build(vec![el(ElementKind::Title, "Kop").with_class("Titel")]).unwrap();
        assert_eq!(none.category, None);
    }

    #[test]
    fn test_chapeau_precedence() {
        let article = build(vec![
            el(ElementKind::Title, "Kop"),
            el(ElementKind::IntroVerse, "Zalig de armen van geest"),
            el(ElementKind::Chapeau, "Een inleiding."),
            el(ElementKind::Body, "Tekst."),
        ])
        .unwrap();
        assert_eq!(article.chapeau, "Een inleiding.");

        let article = build(vec![
            el(ElementKind::Title, "Kop"),
            el(ElementKind::IntroVerse, "Zalig de armen van geest"),
            el(ElementKind::VerseReference, "Matt. 5:3"),
        ])
        .unwrap();
        assert_eq!(article.chapeau, "Zalig de armen van geest");
        assert_eq!(article.verse_reference.as_deref(), Some("Matt. 5:3"));
    }

    #[test]
    fn test_author_bio_kept_out_of_body() {
        let article = build(vec![
            el(ElementKind::Title, "Kop"),
            el(ElementKind::Body, "Tekst."),
            ContentElement::article_end().on_page(1),
            el(ElementKind::AuthorBio, "Ds. Bogerd is predikant te Urk."),
        ])
        .unwrap();
        assert_eq!(article.author_bio.as_deref(), Some("Ds. Bogerd is predikant te Urk."));
        assert!(!article.content.contains("predikant"));
    }

    #[test]
    fn test_captions_and_author_photos() {
        let article = build(vec![
            el(ElementKind::Title, "Kop"),
            ContentElement::image("kerk.jpg").on_page(1),
            el(ElementKind::Caption, "De kerk van Urk"),
            el(ElementKind::Caption, "Onder de preekstoel"),
            ContentElement::image("preekstoel.jpg").on_page(1),
            el(ElementKind::Author, "Tekst: K.H. Bogerd"),
            ContentElement::image("portret.jpg").on_page(1),
        ])
        .unwrap();
        assert_eq!(article.images, ["kerk.jpg", "preekstoel.jpg", "portret.jpg"]);
        assert_eq!(article.captions["kerk.jpg"], "De kerk van Urk");
        assert!(!article.captions.contains_key("preekstoel.jpg"));
        assert_eq!(article.author_photos, ["portret.jpg"]);
    }

    #[test]
    fn test_caption_falls_back_to_following_image() {
        let article = build(vec![
            el(ElementKind::Title, "Kop"),
            el(ElementKind::Body, "a"),
            el(ElementKind::Body, "b"),
            el(ElementKind::Body, "c"),
            el(ElementKind::Body, "d"),
            el(ElementKind::Caption, "Bijschrift"),
            ContentElement::image("foto.jpg").on_page(1),
        ])
        .unwrap();
        assert_eq!(article.captions["foto.jpg"], "Bijschrift");
    }

    #[test]
    fn test_parse_authors_prefix_and_substring() {
        let config = AuthorConfig::default();
        let names = parse_authors(["Tekst: ds. K.H. Bogerd", "Bogerd"], &config);
        assert_eq!(names, ["ds. K.H. Bogerd"]);
    }

    #[test]
    fn test_parse_authors_split_and_upgrade() {
        let config = AuthorConfig::default();
        let names = parse_authors(
            ["Door: Bogerd en A. Jansen", "ds. K.H. Bogerd", "Jo"],
            &config,
        );
        assert_eq!(names, ["ds. K.H. Bogerd", "A. Jansen"]);
    }

    #[test]
    fn test_parse_authors_keeps_doornbos() {
        let names = parse_authors(["Doornbos"], &AuthorConfig::default());
        assert_eq!(names, ["Doornbos"]);
    }

    #[test]
    fn test_window_functions() {
        let items = [1, 0, 0, 0, 5, 0];
        let odd = |x: &i32| x % 2 == 1;
        assert_eq!(nearest_preceding(&items, 4, 3, odd), None);
        assert_eq!(nearest_preceding(&items, 4, 4, odd), Some(0));
        assert_eq!(nearest_following(&items, 1, 3, odd), Some(4));
        assert_eq!(nearest_following(&items, 1, 2, odd), None);
        assert_eq!(nearest_following(&items, 5, 3, odd), None);
        assert_eq!(nearest_preceding(&items, 0, 3, odd), None);
    }

    #[test]
    fn test_render_content() {
        let mut verse = BodyBlock::new(BlockKind::Paragraph, "regel 1\nregel <2>");
        verse.verse = true;
        let html = render_content(&[
            BodyBlock::new(BlockKind::Intro, "Begin"),
            BodyBlock::new(BlockKind::Subheading, "Kop"),
            verse,
            BodyBlock::new(BlockKind::Streamer, "Citaat"),
            BodyBlock::new(BlockKind::Question, "Vraag?"),
            BodyBlock::new(BlockKind::Sidebar, "Kader"),
        ]);
        assert!(html.contains("<p class=\"intro\">Begin</p>"));
        assert!(html.contains("<h3>Kop</h3>"));
        assert!(html.contains("<p>regel 1<br>regel &lt;2&gt;</p>"));
        assert!(html.contains("<blockquote>Citaat</blockquote>"));
        assert!(html.contains("<p class=\"question\">Vraag?</p>"));
        assert!(html.contains("<aside>Kader</aside>"));
    }

    #[test]
    fn test_render_prose_without_breaks() {
        let html = render_content(&[BodyBlock::new(BlockKind::Paragraph, "Eerste regel\ntweede regel")]);
        assert_eq!(html, "<p>Eerste regel tweede regel</p>\n");
    }
}
