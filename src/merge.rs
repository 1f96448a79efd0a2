//! Paragraph reflow.
//!
//! A fixed-layout export splits paragraphs into one fragment per text frame
//! or line. Fragments of the same style that sit close together vertically
//! are joined back into [`BodyBlock`]s here.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::MergeConfig;
use crate::extract::{ContentElement, ElementKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Intro,
    Paragraph,
    Subheading,
    Streamer,
    Sidebar,
    Question,
}

/// A logical block of article body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyBlock {
    pub kind: BlockKind,
    pub text: String,
    /// Verse keeps its line breaks as `\n`.
    pub verse: bool,
}

impl BodyBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            verse: false,
        }
    }
}

fn block_kind(kind: ElementKind) -> Option<BlockKind> {
    match kind {
        ElementKind::Body => Some(BlockKind::Paragraph),
        ElementKind::Subheading => Some(BlockKind::Subheading),
        ElementKind::Streamer => Some(BlockKind::Streamer),
        ElementKind::Sidebar => Some(BlockKind::Sidebar),
        ElementKind::Question => Some(BlockKind::Question),
        _ => None,
    }
}

/// The inline override covering most of the body text, weighted by text
/// length. Text without any override competes as `None`.
pub fn dominant_emphasis(elements: &[ContentElement]) -> Option<String> {
    let mut weights: HashMap<Option<&str>, usize> = HashMap::new();
    let mut order = Vec::new();
    for element in elements.iter().filter(|e| e.kind == ElementKind::Body) {
        let key = element.emphasis.as_deref();
        if !weights.contains_key(&key) {
            order.push(key);
        }
        *weights.entry(key).or_default() += element.text.chars().count();
    }

    let mut best: Option<(Option<&str>, usize)> = None;
    for key in order {
        let weight = weights[&key];
        if best.is_none_or(|(_, w)| weight > w) {
            best = Some((key, weight));
        }
    }
    best.and_then(|(key, _)| key).map(str::to_string)
}

struct OpenParagraph<'a> {
    block: BodyBlock,
    class: Option<&'a str>,
    last: &'a ContentElement,
}

/// Merge an article's body-like elements into blocks.
///
/// Other element kinds in `elements` are ignored.
pub fn merge_paragraphs(
    elements: &[ContentElement],
    dominant: Option<&str>,
    config: &MergeConfig,
) -> Vec<BodyBlock> {
    let threshold = config.gap_threshold();
    let mut blocks = Vec::new();
    let mut open: Option<OpenParagraph<'_>> = None;

    for element in elements {
        let Some(kind) = block_kind(element.kind) else {
            continue;
        };

        if kind != BlockKind::Paragraph {
            blocks.extend(open.take().map(|p| p.block));
            blocks.push(BodyBlock::new(kind, reflow(&element.text, false)));
            continue;
        }

        let verse = element.emphasis.is_some() && element.emphasis.as_deref() != dominant;
        let class = element.class_name.as_deref();

        if let Some(paragraph) = open.as_mut()
            && paragraph.class == class
            && paragraph.block.verse == verse
            && continues(paragraph.last, element, threshold)
        {
            paragraph.block.text.push(if verse { '\n' } else { ' ' });
            paragraph.block.text.push_str(&reflow(&element.text, verse));
            paragraph.last = element;
            continue;
        }

        blocks.extend(open.take().map(|p| p.block));
        open = Some(OpenParagraph {
            block: BodyBlock {
                kind: BlockKind::Paragraph,
                text: reflow(&element.text, verse),
                verse,
            },
            class,
            last: element,
        });
    }
    blocks.extend(open.map(|p| p.block));

    if let Some(first) = blocks.iter_mut().find(|b| b.kind == BlockKind::Paragraph) {
        first.kind = BlockKind::Intro;
    }
    sidebars_last(blocks)
}

/// Prose flows: its line breaks become single spaces. Verse keeps them.
fn reflow(text: &str, verse: bool) -> String {
    if verse {
        text.to_string()
    } else {
        text.replace('\n', " ")
    }
}

/// Does `next` continue the paragraph `prev` ends? The gap is signed: a
/// fragment starting above the previous one's bottom (the next column)
/// always continues.
fn continues(prev: &ContentElement, next: &ContentElement, threshold: f32) -> bool {
    match (prev.position, next.position) {
        (Some(a), Some(b)) => b.top - a.bottom < threshold,
        _ => false,
    }
}

/// Move sidebars to the end in their original order. A subheading directly
/// before a sidebar moves with it.
fn sidebars_last(blocks: Vec<BodyBlock>) -> Vec<BodyBlock> {
    let mut main = Vec::with_capacity(blocks.len());
    let mut tail = Vec::new();
    let mut iter = blocks.into_iter().peekable();

    while let Some(block) = iter.next() {
        let heads_sidebar = block.kind == BlockKind::Subheading
            && iter.peek().is_some_and(|next| next.kind == BlockKind::Sidebar);
        if block.kind == BlockKind::Sidebar || heads_sidebar {
            tail.push(block);
        } else {
            main.push(block);
        }
    }
    main.extend(tail);
    main
}
