//! The ordered keyword table that maps class names to roles.
//!
//! Rows are evaluated top to bottom and the first matching row wins, so the
//! order encodes precedence between overlapping vocabulary: cover classes
//! before generic titles, questions before subheadings (question styles are
//! usually named after the subheading they derive from), body text in a
//! sidebar frame before the sidebar itself.

use super::Role;

/// One row of the classification table.
///
/// A lowercased class name matches when it contains one of `any`, also
/// contains one of `and_any` (unless that list is empty), and contains none
/// of `none`.
#[derive(Debug, Clone, Copy)]
pub struct RoleRule {
    pub role: Role,
    pub any: &'static [&'static str],
    pub and_any: &'static [&'static str],
    pub none: &'static [&'static str],
}

impl RoleRule {
    const fn new(role: Role, any: &'static [&'static str]) -> Self {
        Self {
            role,
            any,
            and_any: &[],
            none: &[],
        }
    }

    const fn and_any(mut self, keywords: &'static [&'static str]) -> Self {
        self.and_any = keywords;
        self
    }

    const fn none(mut self, keywords: &'static [&'static str]) -> Self {
        self.none = keywords;
        self
    }

    pub fn matches(&self, lowered: &str) -> bool {
        let has = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));
        has(self.any) && (self.and_any.is_empty() || has(self.and_any)) && !has(self.none)
    }
}

const COVER: &[&str] = &["cover", "omslag"];
const VERSE: &[&str] = &["bijbeltekst", "verse", "vers-", "-vers"];
const AUTHOR: &[&str] = &["auteur", "author", "byline"];
const SIDEBAR: &[&str] = &["kader", "sidebar", "box"];
const BODY: &[&str] = &["platte-tekst", "plattetekst", "broodtekst", "basistekst", "body"];
const RUNNING: &[&str] = &["kopregel", "voetregel", "paginanummer", "pagina-nummer"];

/// Classification table in precedence order.
pub const ROLE_RULES: &[RoleRule] = &[
    RoleRule::new(Role::CoverTitle, COVER).and_any(&["titel", "title", "kop"]),
    RoleRule::new(Role::CoverChapeau, COVER).and_any(&["chapeau", "intro", "lead"]),
    RoleRule::new(Role::Question, &["vraag", "question"]),
    RoleRule::new(Role::VerseReference, VERSE).and_any(&["ref", "verwijzing", "bron"]),
    RoleRule::new(Role::IntroVerse, VERSE),
    RoleRule::new(Role::AuthorBio, AUTHOR).and_any(&["bio", "info", "personalia"]),
    RoleRule::new(Role::AuthorBio, &["personalia", "biografie"]),
    RoleRule::new(Role::Author, AUTHOR),
    RoleRule::new(Role::Category, &["rubriek", "categorie", "category"]),
    RoleRule::new(Role::Subheading, &["tussenkop", "tussen-kop", "subkop", "subhead"]),
    RoleRule::new(Role::Streamer, &["streamer", "citaat", "quote"]),
    RoleRule::new(Role::Body, SIDEBAR).and_any(BODY),
    RoleRule::new(Role::Sidebar, SIDEBAR),
    RoleRule::new(Role::Caption, &["bijschrift", "onderschrift", "caption"]),
    RoleRule::new(Role::ArticleBoundary, &["eindteken", "einde-artikel", "endmark", "end-mark"]),
    RoleRule::new(Role::Title, &["titel", "title", "kop", "headline"]).none(RUNNING),
    RoleRule::new(Role::Chapeau, &["chapeau", "intro", "lead"]),
    RoleRule::new(Role::Body, BODY).none(RUNNING),
    RoleRule::new(Role::Body, &["tekst"]).none(RUNNING),
];

/// Prefixes the layout tool gives its own generated classes.
const GENERATOR_PREFIXES: &[&str] = &[
    "_idgen",
    "_idcontainer",
    "_idfootnote",
    "_idendnote",
    "_idtextanchor",
    "_idindexmarker",
];

/// Generated local-override fragments that can appear anywhere in a name.
const OVERRIDE_MARKERS: &[&str] = &["charoverride", "paraoverride", "objectstyleoverride"];

/// Is this a class the layout tool generated for local formatting?
pub fn is_generator_class(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    GENERATOR_PREFIXES.iter().any(|p| lowered.starts_with(p))
        || OVERRIDE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Is this an inline character override (the classes that carry italics and
/// other local emphasis inside body text)?
pub fn is_inline_override(name: &str) -> bool {
    name.to_ascii_lowercase().contains("charoverride")
}

/// Run a class name through the table.
pub fn classify_name(name: &str) -> Option<Role> {
    if name.is_empty() || is_generator_class(name) {
        return None;
    }
    let lowered = name.to_lowercase();
    ROLE_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.role)
}
