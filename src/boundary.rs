//! Article boundary detection.
//!
//! The export has no article structure, only a flat stream of elements in
//! page order. [`group_articles`] cuts that stream into article groups with a
//! single sequential scan over an explicit state machine. Articles end at the
//! layout tool's end marker; a few elements after the marker (the author
//! line, a portrait, a boxed bio) still belong to the article that just
//! ended.

use std::mem;

use tracing::debug;

use crate::config::Patterns;
use crate::extract::{ContentElement, ElementKind};

/// The three-part "In memoriam" heading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObituaryHeading {
    /// The opening title, e.g. "In memoriam".
    pub category: String,
    pub name: Option<String>,
    pub lifespan: Option<String>,
}

/// The elements of one article, in stream order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArticleGroup {
    pub elements: Vec<ContentElement>,
    pub obituary: Option<ObituaryHeading>,
}

impl ArticleGroup {
    fn with(elements: Vec<ContentElement>) -> Self {
        Self {
            elements,
            obituary: None,
        }
    }

    pub fn has_title(&self) -> bool {
        self.elements.iter().any(|e| e.kind == ElementKind::Title)
    }

    /// Index of the first page any element sits on.
    pub fn first_page(&self) -> Option<u32> {
        self.elements.iter().map(|e| e.page_index).min()
    }

    pub fn last_page(&self) -> Option<u32> {
        self.elements.iter().map(|e| e.page_index).max()
    }
}

/// Progress through an obituary heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObituaryStage {
    CategorySeen,
    NameSeen,
    LifespanSeen,
}

/// Scanner state.
#[derive(Debug)]
enum State {
    /// No article open. A category seen here waits for the next title.
    Idle { pending_category: Option<ContentElement> },
    /// Content buffered before any title.
    AwaitingTitle { group: ArticleGroup },
    /// A titled article is open.
    Collecting { group: ArticleGroup },
    /// An obituary heading is being assembled.
    Obituary { group: ArticleGroup, stage: ObituaryStage },
    /// An end marker was just seen on `marker_page`. `retro_titles` counts
    /// the late titles just put in front of the sealed article.
    AwaitingTrailing { marker_page: u32, retro_titles: usize },
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Idle { .. } => "idle",
            State::AwaitingTitle { .. } => "awaiting-title",
            State::Collecting { .. } => "collecting",
            State::Obituary { .. } => "obituary",
            State::AwaitingTrailing { .. } => "awaiting-trailing",
        }
    }
}

/// Cut a page-ordered element stream into article groups.
pub fn group_articles(elements: Vec<ContentElement>, patterns: &Patterns) -> Vec<ArticleGroup> {
    let mut scanner = Scanner::new(patterns);
    for element in elements {
        scanner.feed(element);
    }
    scanner.finish()
}

struct Scanner<'p> {
    patterns: &'p Patterns,
    state: State,
    sealed: Vec<ArticleGroup>,
    previous: Option<ElementKind>,
}

impl<'p> Scanner<'p> {
    fn new(patterns: &'p Patterns) -> Self {
        Self {
            patterns,
            state: State::Idle {
                pending_category: None,
            },
            sealed: Vec::new(),
            previous: None,
        }
    }

    fn feed(&mut self, element: ContentElement) {
        let kind = element.kind;
        let state = mem::replace(
            &mut self.state,
            State::Idle {
                pending_category: None,
            },
        );
        let from = state.name();
        self.state = self.step(state, element);
        if from != self.state.name() {
            debug!(from, to = self.state.name(), ?kind, "boundary transition");
        }
        self.previous = Some(kind);
    }

    fn step(&mut self, state: State, element: ContentElement) -> State {
        match state {
            State::Idle { pending_category } => self.idle(pending_category, element),
            State::AwaitingTitle { mut group } => match element.kind {
                ElementKind::Title => self.titled(group, element),
                ElementKind::ArticleEnd => self.seal_at_marker(group, element),
                _ => {
                    group.elements.push(element);
                    State::AwaitingTitle { group }
                }
            },
            State::Collecting { mut group } => match element.kind {
                ElementKind::Title if self.previous == Some(ElementKind::Title) => {
                    group.elements.push(element);
                    State::Collecting { group }
                }
                ElementKind::Title => {
                    self.seal(group);
                    self.open(Vec::new(), element)
                }
                ElementKind::ArticleEnd => self.seal_at_marker(group, element),
                _ => {
                    group.elements.push(element);
                    State::Collecting { group }
                }
            },
            State::Obituary { group, stage } => self.obituary(group, stage, element),
            State::AwaitingTrailing {
                marker_page,
                retro_titles,
            } => self.trailing(marker_page, retro_titles, element),
        }
    }

    fn idle(&mut self, pending_category: Option<ContentElement>, element: ContentElement) -> State {
        match element.kind {
            ElementKind::Title => self.open(pending_category.into_iter().collect(), element),
            ElementKind::Category => State::Idle {
                pending_category: Some(element),
            },
            _ => {
                debug!(kind = ?element.kind, page = element.page_index, "discarding orphan element");
                State::Idle { pending_category }
            }
        }
    }

    fn trailing(&mut self, marker_page: u32, retro_titles: usize, element: ContentElement) -> State {
        let trailing = State::AwaitingTrailing {
            marker_page,
            retro_titles: 0,
        };
        match element.kind {
            ElementKind::Author
            | ElementKind::AuthorBio
            | ElementKind::Image
            | ElementKind::Streamer
            | ElementKind::Sidebar
                if element.page_index == marker_page =>
            {
                if let Some(last) = self.sealed.last_mut() {
                    last.elements.push(element);
                }
                trailing
            }
            ElementKind::Title if retro_titles > 0 => {
                // A subtitle directly after a late title joins the same heading
                if let Some(last) = self.sealed.last_mut() {
                    last.elements.insert(retro_titles, element);
                }
                State::AwaitingTrailing {
                    marker_page,
                    retro_titles: retro_titles + 1,
                }
            }
            ElementKind::Title => {
                if self.attach_retro_title(&element) {
                    State::AwaitingTrailing {
                        marker_page,
                        retro_titles: 1,
                    }
                } else {
                    self.open(Vec::new(), element)
                }
            }
            ElementKind::Category => State::Idle {
                pending_category: Some(element),
            },
            ElementKind::ArticleEnd => trailing,
            _ => State::AwaitingTitle {
                group: ArticleGroup::with(vec![element]),
            },
        }
    }

    fn obituary(&mut self, mut group: ArticleGroup, stage: ObituaryStage, element: ContentElement) -> State {
        match element.kind {
            ElementKind::Title => {
                let heading = group.obituary.get_or_insert_with(ObituaryHeading::default);
                let stage = if self.patterns.lifespan.is_match(&element.text) {
                    heading.lifespan = Some(element.text.clone());
                    ObituaryStage::LifespanSeen
                } else if stage == ObituaryStage::CategorySeen {
                    heading.name = Some(element.text.clone());
                    ObituaryStage::NameSeen
                } else {
                    stage
                };
                group.elements.push(element);
                State::Obituary { group, stage }
            }
            ElementKind::Body | ElementKind::Chapeau | ElementKind::IntroVerse | ElementKind::Question => {
                group.elements.push(element);
                State::Collecting { group }
            }
            ElementKind::ArticleEnd => self.seal_at_marker(group, element),
            _ => {
                group.elements.push(element);
                State::Obituary { group, stage }
            }
        }
    }

    /// Open a new article headed by `title`, after any `leading` elements.
    fn open(&mut self, leading: Vec<ContentElement>, title: ContentElement) -> State {
        self.titled(ArticleGroup::with(leading), title)
    }

    /// Give `group` its title and pick the collecting mode.
    fn titled(&mut self, mut group: ArticleGroup, title: ContentElement) -> State {
        if self.patterns.obituary.is_match(&title.text) {
            group.obituary = Some(ObituaryHeading {
                category: title.text.clone(),
                ..Default::default()
            });
            group.elements.push(title);
            State::Obituary {
                group,
                stage: ObituaryStage::CategorySeen,
            }
        } else {
            group.elements.push(title);
            State::Collecting { group }
        }
    }

    fn seal_at_marker(&mut self, mut group: ArticleGroup, marker: ContentElement) -> State {
        let marker_page = marker.page_index;
        group.elements.push(marker);
        self.seal(group);
        State::AwaitingTrailing {
            marker_page,
            retro_titles: 0,
        }
    }

    fn seal(&mut self, group: ArticleGroup) {
        if !group.elements.is_empty() {
            self.sealed.push(group);
        }
    }

    /// Put a late title at the front of the last sealed article when that
    /// article has none and is on an adjacent page.
    fn attach_retro_title(&mut self, title: &ContentElement) -> bool {
        let Some(last) = self.sealed.last_mut() else {
            return false;
        };
        if last.has_title() {
            return false;
        }
        let near = last
            .last_page()
            .is_some_and(|page| title.page_index.abs_diff(page) <= 1);
        if near {
            debug!(page = title.page_index, "attaching title to preceding untitled article");
            last.elements.insert(0, title.clone());
        }
        near
    }

    fn finish(mut self) -> Vec<ArticleGroup> {
        match mem::replace(
            &mut self.state,
            State::Idle {
                pending_category: None,
            },
        ) {
            State::AwaitingTitle { group }
            | State::Collecting { group }
            | State::Obituary { group, .. } => self.seal(group),
            State::Idle { .. } | State::AwaitingTrailing { .. } => {}
        }
        self.sealed
    }
}
