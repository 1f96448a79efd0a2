//! End-to-end import: load, classify, extract, group, build, resolve.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::article::{Article, build_article};
use crate::boundary::group_articles;
use crate::classify::{Role, StyleClassification};
use crate::config::Config;
use crate::error::Result;
use crate::extract::{ContentElement, Extractor};
use crate::loader::{EditionMetadata, LoadedExport, load_export};
use crate::resolve::{AuthorRecord, ImageRecord, resolve_authors, resolve_images};

/// How an import went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Completed,
    CompletedWithWarnings,
    /// No article could be salvaged.
    Failed,
}

/// Everything an import produced.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub outcome: Outcome,
    pub edition: EditionMetadata,
    pub articles: Vec<Article>,
    pub authors: Vec<AuthorRecord>,
    pub images: Vec<ImageRecord>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ImportReport {
    fn new(
        edition: EditionMetadata,
        articles: Vec<Article>,
        authors: Vec<AuthorRecord>,
        images: Vec<ImageRecord>,
        warnings: Vec<String>,
        errors: Vec<String>,
    ) -> Self {
        let outcome = if articles.is_empty() {
            Outcome::Failed
        } else if warnings.is_empty() && errors.is_empty() {
            Outcome::Completed
        } else {
            Outcome::CompletedWithWarnings
        };
        Self {
            outcome,
            edition,
            articles,
            authors,
            images,
            warnings,
            errors,
        }
    }
}

/// Import an export directory.
///
/// Only an invalid configuration is an `Err`; everything that goes wrong
/// with the export itself ends up in the report.
pub fn process_directory(dir: &Path, config: &Config) -> Result<ImportReport> {
    let export = load_export(dir, &config.images);
    process_export(export, config)
}

/// Run the pipeline over an already loaded export.
pub fn process_export(export: LoadedExport, config: &Config) -> Result<ImportReport> {
    let patterns = config.patterns()?;
    let LoadedExport {
        pages,
        images,
        declared_rules,
        mut edition,
        mut warnings,
        errors,
    } = export;

    let classification = StyleClassification::build(
        &declared_rules,
        pages.iter().flat_map(|p| p.dom.used_classes()),
    );
    info!(classes = classification.len(), "classified styles");
    for role in [Role::Title, Role::Body] {
        if !pages.is_empty() && !classification.has_role(role) {
            let message = format!("no style class recognised as {role:?}");
            warn!("{message}");
            warnings.push(message);
        }
    }

    let (extractor, selector_warnings) = Extractor::new(&classification, &config.markers);
    warnings.extend(selector_warnings);

    if edition.cover_headline.is_none() {
        edition.cover_headline = pages
            .iter()
            .find(|p| p.is_cover())
            .and_then(|p| extractor.cover_headline(p));
    }

    let per_page: Vec<(u32, Vec<ContentElement>)> = pages
        .par_iter()
        .filter(|p| !p.is_cover())
        .map(|p| (p.page_start, extractor.extract_page(p)))
        .collect();

    let mut stream = Vec::new();
    for (page, elements) in per_page {
        if elements.is_empty() {
            let message = format!("page {page} yielded no content elements");
            warn!("{message}");
            warnings.push(message);
        }
        stream.extend(elements);
    }

    let groups = group_articles(stream, &patterns);
    info!(groups = groups.len(), "grouped articles");

    let built: Vec<_> = groups
        .par_iter()
        .map(|group| build_article(group, config))
        .collect();
    let mut articles = Vec::with_capacity(built.len());
    for result in built {
        match result {
            Ok(article) => articles.push(article),
            Err(e) => {
                let message = format!("article skipped: {e}");
                warn!("{message}");
                warnings.push(message);
            }
        }
    }

    let authors = resolve_authors(&articles, &images);
    let image_records = resolve_images(&articles, &images);

    let report = ImportReport::new(edition, articles, authors, image_records, warnings, errors);
    info!(
        outcome = ?report.outcome,
        articles = report.articles.len(),
        warnings = report.warnings.len(),
        "import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::PageDocument;

    fn export(pages: Vec<PageDocument>) -> LoadedExport {
        LoadedExport {
            pages,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_article() {
        let pages = vec![
            PageDocument::parse(0, "Blad.html", r#"<p class="Cover-titel">Omslag</p>"#),
            PageDocument::parse(
                1,
                "Blad-1.html",
                r#"<p class="Titel">Test Article Title</p>
                   <p class="Platte-tekst">This is the article body. ■</p>"#,
            ),
        ];
        let report = process_export(export(pages), &Config::default()).unwrap();

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.articles.len(), 1);
        assert_eq!(report.articles[0].title, "Test Article Title");
        assert!(report.articles[0].content.contains("article body"));
        assert_eq!(report.edition.cover_headline.as_deref(), Some("Omslag"));
    }

    #[test]
    fn test_no_articles_fails() {
        let pages = vec![PageDocument::parse(1, "Blad-1.html", "<p>los</p>")];
        let report = process_export(export(pages), &Config::default()).unwrap();
        assert_eq!(report.outcome, Outcome::Failed);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_untitled_group_is_warning() {
        let pages = vec![PageDocument::parse(
            1,
            "Blad-1.html",
            r#"<p class="Titel">Kop</p><p class="Platte-tekst">Tekst ■</p>
               <p class="Platte-tekst">Zwerftekst ■</p>"#,
        )];
        let report = process_export(export(pages), &Config::default()).unwrap();
        assert_eq!(report.articles.len(), 1);
        assert_eq!(report.outcome, Outcome::CompletedWithWarnings);
        assert!(report.warnings.iter().any(|w| w.contains("no title")));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let mut config = Config::default();
        config.markers.obituary_pattern = "(".to_string();
        assert!(process_export(export(Vec::new()), &config).is_err());
    }
}
