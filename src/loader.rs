//! Export discovery: page documents, stylesheets, images and edition data.
//!
//! An export directory looks like this:
//!
//! ```text
//! Kerkblad.html                  cover, printed page 1
//! Kerkblad-1.html                printed page 2
//! Kerkblad-2.html                printed page 3
//! Kerkblad-web-resources/
//!     css/idGeneratedStyles.css
//!     image/Portret-auteur.jpg
//! ```
//!
//! Nothing here is fatal. Problems become warnings (or, for a missing export
//! directory, an error entry) and whatever could be read is returned.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ImageConfig;
use crate::dom::{ArenaDom, DeclaredRule, parse_html, scan_stylesheet};
use crate::error::{Error, Result};
use crate::util::{collapse_whitespace, decode_text, extract_meta_charset};

const RESOURCES_SUFFIX: &str = "-web-resources";

/// How many leading pages are searched for edition metadata.
const EDITION_SCAN_PAGES: usize = 3;

/// One exported page, parsed.
#[derive(Debug)]
pub struct PageDocument {
    /// Sequential index; the cover is 0.
    pub index: u32,
    pub page_start: u32,
    pub page_end: u32,
    pub dom: ArenaDom,
    pub filename: String,
}

impl PageDocument {
    /// Wrap an already parsed page. Printed numbering follows the index.
    pub fn new(index: u32, filename: impl Into<String>, dom: ArenaDom) -> Self {
        Self {
            index,
            page_start: index + 1,
            page_end: index + 1,
            dom,
            filename: filename.into(),
        }
    }

    /// Parse page markup.
    pub fn parse(index: u32, filename: impl Into<String>, html: &str) -> Self {
        Self::new(index, filename, parse_html(html))
    }

    pub fn is_cover(&self) -> bool {
        self.index == 0
    }
}

/// Everything read from an export directory.
#[derive(Debug, Default)]
pub struct LoadedExport {
    /// Pages sorted by index.
    pub pages: Vec<PageDocument>,
    pub images: ImageIndex,
    pub declared_rules: Vec<DeclaredRule>,
    pub edition: EditionMetadata,
    pub warnings: Vec<String>,
    /// Conditions that left nothing to work with.
    pub errors: Vec<String>,
}

/// Issue data printed on the cover and first pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditionMetadata {
    pub issue_number: Option<u32>,
    pub volume: Option<u32>,
    pub issue_date: Option<NaiveDate>,
    pub cover_headline: Option<String>,
}

static ISSUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:nummer|nr\.|editie)\s*(\d{1,4})\b").expect("ISSUE_RE should compile")
});
static VOLUME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bjaargang\s*(\d{1,4})\b").expect("VOLUME_RE should compile"));
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s+(januari|februari|maart|april|mei|juni|juli|augustus|september|oktober|november|december)\s+(\d{4})\b",
    )
    .expect("DATE_RE should compile")
});

const DUTCH_MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

impl EditionMetadata {
    /// Scrape issue number, volume and date from page texts. The first match
    /// of each wins.
    pub fn scrape<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut meta = Self::default();
        for text in texts {
            if meta.issue_number.is_none() {
                meta.issue_number = capture_number(&ISSUE_RE, text);
            }
            if meta.volume.is_none() {
                meta.volume = capture_number(&VOLUME_RE, text);
            }
            if meta.issue_date.is_none() {
                meta.issue_date = parse_dutch_date(text);
            }
        }
        meta
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Find the first `<day> <month> <year>` date with a Dutch month name.
pub fn parse_dutch_date(text: &str) -> Option<NaiveDate> {
    DATE_RE.captures_iter(text).find_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = caps[2].to_lowercase();
        let month = DUTCH_MONTHS.iter().position(|m| *m == month)? as u32 + 1;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// What an image file is for, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageBucket {
    AuthorPhoto,
    Decorative,
    Content,
}

impl ImageBucket {
    pub fn for_filename(filename: &str, config: &ImageConfig) -> Self {
        let lowered = filename.to_lowercase();
        let has = |keywords: &[String]| keywords.iter().any(|k| lowered.contains(k.as_str()));

        if has(&config.author_photo_keywords) {
            ImageBucket::AuthorPhoto
        } else if lowered.ends_with(".svg") || has(&config.decorative_keywords) {
            ImageBucket::Decorative
        } else {
            ImageBucket::Content
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub bucket: ImageBucket,
}

/// The export's image files by filename.
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    entries: BTreeMap<String, ImageEntry>,
}

impl ImageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every file directly inside `dir`.
    pub fn from_dir(dir: &Path, config: &ImageConfig) -> Result<Self> {
        let mut index = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            index.insert(name, entry.path(), config);
        }
        Ok(index)
    }

    pub fn insert(&mut self, filename: impl Into<String>, path: PathBuf, config: &ImageConfig) {
        let filename = filename.into();
        let bucket = ImageBucket::for_filename(&filename, config);
        self.entries.insert(filename, ImageEntry { path, bucket });
    }

    pub fn get(&self, filename: &str) -> Option<&ImageEntry> {
        self.entries.get(filename)
    }

    pub fn path_of(&self, filename: &str) -> Option<&Path> {
        self.get(filename).map(|e| e.path.as_path())
    }

    pub fn bucket_of(&self, filename: &str) -> Option<ImageBucket> {
        self.get(filename).map(|e| e.bucket)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageEntry)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Page number encoded in a page filename: `<stem>.html` is 0,
/// `<stem>-<n>.html` is `n`.
pub fn page_number(filename: &str, stem: &str) -> Result<u32> {
    let invalid = || Error::InvalidPageName(filename.to_string());

    let base = filename
        .strip_suffix(".html")
        .or_else(|| filename.strip_suffix(".htm"))
        .ok_or_else(invalid)?;
    if base == stem {
        return Ok(0);
    }
    base.strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('-'))
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|n| n.parse().ok())
        .ok_or_else(invalid)
}

fn is_page_file(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    lowered.ends_with(".html") || lowered.ends_with(".htm")
}

/// Work out the export's filename stem: from the resources directory when
/// there is one, else the shortest page name.
fn detect_stem(page_names: &[String], resource_dirs: &[String]) -> Option<String> {
    if let Some(dir) = resource_dirs.first() {
        return dir.strip_suffix(RESOURCES_SUFFIX).map(str::to_string);
    }
    page_names
        .iter()
        .filter_map(|name| name.rsplit_once('.').map(|(base, _)| base))
        .min_by_key(|base| base.len())
        .map(str::to_string)
}

/// Load an export directory.
pub fn load_export(dir: &Path, images: &ImageConfig) -> LoadedExport {
    let mut export = LoadedExport::default();

    if !dir.is_dir() {
        let error = Error::MissingDirectory(dir.to_path_buf()).to_string();
        warn!("{error}");
        export.errors.push(error);
        return export;
    }

    let (page_names, resource_dirs) = match list_export(dir) {
        Ok(listing) => listing,
        Err(e) => {
            let error = format!("cannot list {}: {e}", dir.display());
            warn!("{error}");
            export.errors.push(error);
            return export;
        }
    };

    let Some(stem) = detect_stem(&page_names, &resource_dirs) else {
        export.warn(format!("no page documents in {}", dir.display()));
        return export;
    };
    debug!(stem = %stem, pages = page_names.len(), "discovered export");

    let mut numbered = Vec::with_capacity(page_names.len());
    for name in page_names {
        match page_number(&name, &stem) {
            Ok(index) => numbered.push((index, name)),
            Err(e) => export.warn(format!("skipping {name}: {e}")),
        }
    }

    let results: Vec<_> = numbered
        .par_iter()
        .map(|(index, name)| read_page(&dir.join(name), *index, name))
        .collect();
    for (result, (_, name)) in results.into_iter().zip(&numbered) {
        match result {
            Ok(page) => export.pages.push(page),
            Err(e) => export.warn(format!("skipping unreadable page {name}: {e}")),
        }
    }
    export.pages.sort_by_key(|p| p.index);

    let resources = dir.join(format!("{stem}{RESOURCES_SUFFIX}"));
    export.declared_rules = export.load_stylesheets(&resources.join("css"));
    export.images = export.load_images(&resources.join("image"), images);

    let texts: Vec<String> = export
        .pages
        .iter()
        .take(EDITION_SCAN_PAGES)
        .map(|p| collapse_whitespace(&p.dom.collect_text(p.dom.document())))
        .collect();
    export.edition = EditionMetadata::scrape(texts.iter().map(String::as_str));

    info!(
        pages = export.pages.len(),
        rules = export.declared_rules.len(),
        images = export.images.len(),
        "loaded export"
    );
    export
}

fn list_export(dir: &Path) -> Result<(Vec<String>, Vec<String>)> {
    let mut pages = Vec::new();
    let mut resources = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let file_type = entry.file_type()?;
        if file_type.is_dir() && name.ends_with(RESOURCES_SUFFIX) {
            resources.push(name);
        } else if file_type.is_file() && is_page_file(&name) {
            pages.push(name);
        }
    }
    pages.sort();
    resources.sort();
    Ok((pages, resources))
}

fn read_page(path: &Path, index: u32, name: &str) -> Result<PageDocument> {
    let bytes = std::fs::read(path)?;
    let html = decode_text(&bytes, extract_meta_charset(&bytes));
    Ok(PageDocument::parse(index, name, &html))
}

impl LoadedExport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    fn load_stylesheets(&mut self, css_dir: &Path) -> Vec<DeclaredRule> {
        let mut rules = Vec::new();
        let entries = match std::fs::read_dir(css_dir) {
            Ok(entries) => entries,
            Err(_) => {
                self.warn(format!("no stylesheet directory at {}", css_dir.display()));
                return rules;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("css")))
            .collect();
        paths.sort();

        for path in paths {
            match std::fs::read(&path) {
                Ok(bytes) => rules.extend(scan_stylesheet(&decode_text(&bytes, None))),
                Err(e) => self.warn(format!("cannot read {}: {e}", path.display())),
            }
        }
        rules
    }

    fn load_images(&mut self, image_dir: &Path, config: &ImageConfig) -> ImageIndex {
        match ImageIndex::from_dir(image_dir, config) {
            Ok(index) => index,
            Err(_) => {
                self.warn(format!("no image directory at {}", image_dir.display()));
                ImageIndex::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number("Kerkblad.html", "Kerkblad").unwrap(), 0);
        assert_eq!(page_number("Kerkblad-1.html", "Kerkblad").unwrap(), 1);
        assert_eq!(page_number("Kerkblad-12.html", "Kerkblad").unwrap(), 12);
        assert!(page_number("Kerkblad-a.html", "Kerkblad").is_err());
        assert!(page_number("Ander-1.html", "Kerkblad").is_err());
        assert!(page_number("Kerkblad-1.txt", "Kerkblad").is_err());
    }

    #[test]
    fn test_page_number_with_hyphenated_stem() {
        assert_eq!(page_number("Blad-2026-04-3.html", "Blad-2026-04").unwrap(), 3);
        assert_eq!(page_number("Blad-2026-04.html", "Blad-2026-04").unwrap(), 0);
    }

    #[test]
    fn test_detect_stem() {
        let pages = vec!["Blad-1.html".to_string(), "Blad.html".to_string()];
        assert_eq!(detect_stem(&pages, &[]).as_deref(), Some("Blad"));
        let dirs = vec!["Other-web-resources".to_string()];
        assert_eq!(detect_stem(&pages, &dirs).as_deref(), Some("Other"));
        assert_eq!(detect_stem(&[], &[]), None);
    }

    #[test]
    fn test_printed_numbers_follow_index() {
        let page = PageDocument::parse(2, "Blad-2.html", "<p>x</p>");
        assert_eq!((page.page_start, page.page_end), (3, 3));
        assert!(!page.is_cover());
    }

    #[test]
    fn test_image_buckets() {
        let config = ImageConfig::default();
        assert_eq!(
            ImageBucket::for_filename("Portret-Bogerd.jpg", &config),
            ImageBucket::AuthorPhoto
        );
        assert_eq!(ImageBucket::for_filename("Logo.png", &config), ImageBucket::Decorative);
        assert_eq!(ImageBucket::for_filename("kruis.svg", &config), ImageBucket::Decorative);
        assert_eq!(ImageBucket::for_filename("kerk.jpg", &config), ImageBucket::Content);
    }

    #[test]
    fn test_scrape_edition() {
        let meta = EditionMetadata::scrape([
            "Kerkblad",
            "Jaargang 74 • nummer 3 • 14 maart 2026",
            "nummer 9",
        ]);
        assert_eq!(meta.issue_number, Some(3));
        assert_eq!(meta.volume, Some(74));
        assert_eq!(meta.issue_date, NaiveDate::from_ymd_opt(2026, 3, 14));
        assert_eq!(meta.cover_headline, None);
    }

    #[test]
    fn test_invalid_date_skipped() {
        assert_eq!(parse_dutch_date("31 februari 2026, 2 mei 2026"), NaiveDate::from_ymd_opt(2026, 5, 2));
        assert_eq!(parse_dutch_date("geen datum"), None);
    }

    #[test]
    fn test_missing_directory_is_error_entry() {
        let export = load_export(Path::new("/nonexistent/folio-export"), &ImageConfig::default());
        assert!(export.pages.is_empty());
        assert_eq!(export.errors.len(), 1);
    }
}
