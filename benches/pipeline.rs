//! Benchmarks for the import pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use folio::{
    Config, Extractor, LoadedExport, PageDocument, StyleClassification, group_articles,
    process_export,
};

const PAGES: u32 = 48;
const ARTICLES_PER_PAGE: u32 = 3;

/// Markup for one synthetic page: a few articles of positioned fragments.
fn page_html(index: u32) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head></head><body>");
    for a in 0..ARTICLES_PER_PAGE {
        let top = a as f32 * 1200.0;
        html.push_str(&format!(
            r#"<p class="Titel">Artikel {index}.{a}</p>
               <p class="Chapeau">Een korte inleiding bij dit artikel.</p>"#
        ));
        for f in 0..8 {
            let y = top + f as f32 * 110.0;
            html.push_str(&format!(
                r#"<div style="position:absolute;top:{y}px;height:100px"><p class="Platte-tekst">Regel {f} van een alinea die over meerdere tekstkaders loopt.</p></div>"#
            ));
        }
        html.push_str(r#"<p class="Auteur">Tekst: ds. K.H. Bogerd</p>"#);
        html.push_str(r#"<p class="Platte-tekst">Slot. ■</p>"#);
    }
    html.push_str("</body></html>");
    html
}

fn synthetic_pages() -> Vec<PageDocument> {
    (0..=PAGES)
        .map(|i| PageDocument::parse(i, format!("Blad-{i}.html"), &page_html(i)))
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let html = page_html(1);
    c.bench_function("parse_page", |b| {
        b.iter(|| PageDocument::parse(1, "Blad-1.html", &html));
    });
}

fn bench_extract(c: &mut Criterion) {
    let pages = synthetic_pages();
    let classification = StyleClassification::from_names(pages[1].dom.used_classes());
    let config = Config::default();
    let (extractor, _) = Extractor::new(&classification, &config.markers);

    c.bench_function("extract_page", |b| {
        b.iter(|| extractor.extract_page(&pages[1]));
    });

    let patterns = config.patterns().unwrap();
    let stream: Vec<_> = pages.iter().flat_map(|p| extractor.extract_page(p)).collect();
    c.bench_function("group_articles", |b| {
        b.iter(|| group_articles(stream.clone(), &patterns));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let config = Config::default();
    c.bench_function("process_export", |b| {
        b.iter_batched(
            || LoadedExport {
                pages: synthetic_pages(),
                ..Default::default()
            },
            |export| process_export(export, &config).unwrap(),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_parse, bench_extract, bench_pipeline);
criterion_main!(benches);
