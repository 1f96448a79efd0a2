//! # folio
//!
//! Reconstruct magazine articles from a per-page HTML export of a print
//! layout.
//!
//! A fixed-layout export has one HTML file per printed page and knows
//! nothing about articles: text frames are absolutely positioned, paragraphs
//! are split across frames and the only semantic hints are the names of the
//! designer's paragraph styles. folio recovers the editorial structure:
//!
//! - classify style class names into roles ([`classify`])
//! - load and order the pages ([`loader`])
//! - extract typed elements per page, in parallel ([`extract`])
//! - cut the element stream into articles at end markers ([`boundary`])
//! - reflow paragraph fragments ([`merge`]) and assemble articles ([`article`])
//! - consolidate authors and images across articles ([`resolve`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{Config, Outcome, process_directory};
//!
//! let report = process_directory("export/".as_ref(), &Config::default()).unwrap();
//! if report.outcome != Outcome::Failed {
//!     for article in &report.articles {
//!         println!("{} (p. {}-{})", article.title, article.page_start, article.page_end);
//!     }
//! }
//! ```

pub mod article;
pub mod boundary;
pub mod classify;
pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod resolve;
pub(crate) mod util;

pub use article::{Article, build_article, parse_authors};
pub use boundary::{ArticleGroup, ObituaryHeading, group_articles};
pub use classify::{Role, StyleClassification};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{ContentElement, ElementKind, Extractor};
pub use loader::{EditionMetadata, ImageIndex, LoadedExport, PageDocument, load_export};
pub use merge::{BlockKind, BodyBlock, merge_paragraphs};
pub use pipeline::{ImportReport, Outcome, process_directory, process_export};
pub use resolve::{AuthorRecord, ImageRecord, resolve_authors, resolve_images};
