//! Property tests over random element streams.

use proptest::prelude::*;

use folio::{Config, ContentElement, ElementKind, build_article, group_articles};

fn kind() -> impl Strategy<Value = ElementKind> {
    prop_oneof![
        3 => Just(ElementKind::Title),
        6 => Just(ElementKind::Body),
        1 => Just(ElementKind::Chapeau),
        1 => Just(ElementKind::Author),
        1 => Just(ElementKind::AuthorBio),
        1 => Just(ElementKind::Category),
        1 => Just(ElementKind::Caption),
        1 => Just(ElementKind::Image),
        1 => Just(ElementKind::Sidebar),
        2 => Just(ElementKind::ArticleEnd),
    ]
}

/// A stream of elements on non-decreasing pages.
fn stream() -> impl Strategy<Value = Vec<ContentElement>> {
    prop::collection::vec((kind(), 0u32..3, "[a-z]{1,8}"), 0..40).prop_map(|items| {
        let mut page = 1;
        items
            .into_iter()
            .map(|(kind, step, text)| {
                page += step / 2;
                match kind {
                    ElementKind::Image => ContentElement::image(format!("{text}.jpg")),
                    ElementKind::ArticleEnd => ContentElement::article_end(),
                    kind => ContentElement::new(kind, text),
                }
                .on_page(page)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_page_range_comes_from_own_elements(elements in stream()) {
        let config = Config::default();
        let patterns = config.patterns().unwrap();

        for group in group_articles(elements, &patterns) {
            prop_assert!(!group.elements.is_empty());
            let Ok(article) = build_article(&group, &config) else {
                prop_assert!(!group.has_title());
                continue;
            };

            let min = group.elements.iter().map(|e| e.page_start).min().unwrap();
            let max = group.elements.iter().map(|e| e.page_end).max().unwrap();
            prop_assert!(article.page_start <= article.page_end);
            prop_assert_eq!(article.page_start, min);
            prop_assert_eq!(article.page_end, max);
            prop_assert!(!article.source_pages.is_empty());
        }
    }

    #[test]
    fn prop_grouping_never_invents_elements(elements in stream()) {
        let patterns = Config::default().patterns().unwrap();
        let total = elements.len();
        let grouped: usize = group_articles(elements, &patterns)
            .iter()
            .map(|g| g.elements.len())
            .sum();
        prop_assert!(grouped <= total);
    }

    #[test]
    fn prop_title_then_marker_is_one_article(
        between in prop::collection::vec(
            prop_oneof![Just(ElementKind::Body), Just(ElementKind::Chapeau), Just(ElementKind::Caption)],
            0..6,
        )
    ) {
        let mut elements = vec![ContentElement::new(ElementKind::Title, "Kop").on_page(1)];
        elements.extend(between.iter().map(|&k| ContentElement::new(k, "tekst").on_page(1)));
        elements.push(ContentElement::article_end().on_page(1));
        let expected = elements.len();

        let patterns = Config::default().patterns().unwrap();
        let groups = group_articles(elements, &patterns);
        prop_assert_eq!(groups.len(), 1);
        prop_assert_eq!(groups[0].elements.len(), expected);
    }
}
