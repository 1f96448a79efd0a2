//! Cross-article author and image consolidation.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::article::Article;
use crate::loader::{ImageBucket, ImageIndex};
use crate::util::normalize_key;

/// One author across the whole edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRecord {
    /// Display form as first seen.
    pub name: String,
    pub photo: Option<String>,
    pub photo_path: Option<PathBuf>,
    /// Titles of the articles credited to this author, in article order.
    pub articles: Vec<String>,
}

/// One content image of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub filename: String,
    pub source: Option<PathBuf>,
    pub caption: Option<String>,
    pub featured: bool,
    pub sort_order: usize,
    pub article: String,
}

/// Author photo candidates of an article, preferring files named like
/// portraits.
fn photo_candidates<'a>(article: &'a Article, images: &ImageIndex) -> Vec<&'a str> {
    let (mut portraits, others): (Vec<&str>, Vec<&str>) = article
        .author_photos
        .iter()
        .map(String::as_str)
        .partition(|f| images.bucket_of(f) == Some(ImageBucket::AuthorPhoto));
    portraits.extend(others);
    portraits
}

/// Merge the authors of all articles by normalized name.
///
/// The n-th author of an article is offered the n-th photo candidate; a
/// record keeps the first photo it gets.
pub fn resolve_authors(articles: &[Article], images: &ImageIndex) -> Vec<AuthorRecord> {
    let mut records: Vec<AuthorRecord> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for article in articles {
        let candidates = photo_candidates(article, images);
        for (i, name) in article.authors.iter().enumerate() {
            let key = normalize_key(name);
            let index = *by_key.entry(key).or_insert_with(|| {
                records.push(AuthorRecord {
                    name: name.clone(),
                    photo: None,
                    photo_path: None,
                    articles: Vec::new(),
                });
                records.len() - 1
            });
            let record = &mut records[index];

            if !record.articles.contains(&article.title) {
                record.articles.push(article.title.clone());
            }
            if record.photo.is_none()
                && let Some(photo) = candidates.get(i)
            {
                record.photo = Some(photo.to_string());
                record.photo_path = images.path_of(photo).map(PathBuf::from);
            }
        }
    }

    debug!(authors = records.len(), "resolved authors");
    records
}

/// List the content images of every article. Author photos and decorative
/// files are left out.
pub fn resolve_images(articles: &[Article], images: &ImageIndex) -> Vec<ImageRecord> {
    let mut records = Vec::new();

    for article in articles {
        let content = article.images.iter().filter(|f| {
            !article.author_photos.contains(f)
                && !matches!(
                    images.bucket_of(f),
                    Some(ImageBucket::Decorative | ImageBucket::AuthorPhoto)
                )
        });
        for (sort_order, filename) in content.enumerate() {
            records.push(ImageRecord {
                filename: filename.clone(),
                source: images.path_of(filename).map(PathBuf::from),
                caption: article.captions.get(filename).cloned(),
                featured: sort_order == 0,
                sort_order,
                article: article.title.clone(),
            });
        }
    }

    debug!(images = records.len(), "resolved images");
    records
}
