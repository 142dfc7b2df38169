//! Per-document match reports.
//!
//! A paged document is checked field by field: the title, then for every
//! page its text, its translation and each annotation. A raw document only
//! has page text, scanned with duplicate suppression.

use serde::Serialize;

use crate::{
    config::SearchConfig,
    model::{Annotation, Document, DocumentBody, Page},
    snippet::{Keyword, SnippetWindow, Snippets, distinct_snippets},
};

/// Where inside a page a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Text,
    Translation,
    AnnotationName,
    AnnotationType,
    AnnotationContent,
}

impl MatchSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Translation => "translation",
            Self::AnnotationName => "annotation_name",
            Self::AnnotationType => "annotation_type",
            Self::AnnotationContent => "annotation_content",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A title hit. The title is never truncated, so both fields hold it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleMatch {
    pub matched_text: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    #[serde(rename = "type")]
    pub source: MatchSource,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMatches {
    pub page_number: usize,
    pub matches: Vec<FieldMatch>,
    pub match_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub title_matches: Vec<TitleMatch>,
    pub page_matches: Vec<PageMatches>,
}

impl MatchReport {
    pub fn is_empty(&self) -> bool {
        self.title_matches.is_empty() && self.page_matches.is_empty()
    }

    pub fn total_matches(&self) -> usize {
        self.title_matches.len()
            + self
                .page_matches
                .iter()
                .map(|page| page.match_count)
                .sum::<usize>()
    }
}

/// Snippets found on one page of a raw document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawPageMatches {
    pub page_number: usize,
    pub lines: Vec<String>,
}

/// The matches of one document, shaped by its body layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentMatches {
    Paged(MatchReport),
    Raw(Vec<RawPageMatches>),
}

impl DocumentMatches {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Paged(report) => report.is_empty(),
            Self::Raw(pages) => pages.is_empty(),
        }
    }
}

/// Collect every match of `keyword` in `document`.
pub fn aggregate(
    document: &Document,
    keyword: &Keyword,
    config: &SearchConfig,
) -> DocumentMatches {
    match &document.body {
        DocumentBody::Paged { pages } => DocumentMatches::Paged(match_pages(
            document.title.as_deref(),
            pages,
            keyword,
            config.structured,
        )),
        DocumentBody::Raw { text } => {
            DocumentMatches::Raw(match_raw_pages(text, keyword, config.raw))
        }
    }
}

pub fn match_pages(
    title: Option<&str>,
    pages: &[Page],
    keyword: &Keyword,
    window: SnippetWindow,
) -> MatchReport {
    let title_matches = title
        .filter(|title| keyword.is_found_in(title))
        .map(|title| TitleMatch {
            matched_text: title.to_string(),
            context: title.to_string(),
        })
        .into_iter()
        .collect();

    let page_matches = pages
        .iter()
        .enumerate()
        .filter_map(|(idx, page)| {
            let matches = match_page(page, keyword, window);
            (!matches.is_empty()).then(|| PageMatches {
                page_number: idx + 1,
                match_count: matches.len(),
                matches,
            })
        })
        .collect();

    MatchReport {
        title_matches,
        page_matches,
    }
}

fn match_page(
    page: &Page,
    keyword: &Keyword,
    window: SnippetWindow,
) -> Vec<FieldMatch> {
    let mut matches = Vec::new();

    let text_fields = [
        (MatchSource::Text, page.text.as_deref()),
        (MatchSource::Translation, page.jp_translation.as_deref()),
    ];
    for (source, value) in text_fields {
        let Some(value) = value else { continue };
        matches.extend(Snippets::new(value, keyword, window).map(|snippet| {
            FieldMatch {
                source,
                context: snippet.context,
            }
        }));
    }

    for (idx, annotation) in page.annotations.iter().enumerate() {
        match_annotation(annotation, idx + 1, keyword, &mut matches);
    }

    matches
}

fn match_annotation(
    annotation: &Annotation,
    position: usize,
    keyword: &Keyword,
    matches: &mut Vec<FieldMatch>,
) {
    let fields = [
        (MatchSource::AnnotationName, annotation.target_text.as_deref()),
        (MatchSource::AnnotationType, annotation.kind.as_deref()),
        (MatchSource::AnnotationContent, annotation.content.as_deref()),
    ];
    for (source, value) in fields {
        if let Some(value) = value
            && keyword.is_found_in(value)
        {
            matches.push(FieldMatch {
                source,
                context: format!("#{position}: {value}"),
            });
        }
    }
}

pub fn match_raw_pages(
    text: &[Option<String>],
    keyword: &Keyword,
    window: SnippetWindow,
) -> Vec<RawPageMatches> {
    text.iter()
        .enumerate()
        .filter_map(|(idx, blob)| {
            let blob = blob.as_deref()?;
            let lines: Vec<String> = distinct_snippets(blob, keyword, window)
                .into_iter()
                .map(String::from)
                .collect();
            (!lines.is_empty()).then_some(RawPageMatches {
                page_number: idx + 1,
                lines,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentType;

    fn kw(raw: &str) -> Keyword {
        Keyword::new(raw).unwrap()
    }

    fn report(document: &Document, keyword: &str) -> MatchReport {
        match aggregate(document, &kw(keyword), &SearchConfig::default()) {
            DocumentMatches::Paged(report) => report,
            DocumentMatches::Raw(_) => panic!("expected a paged report"),
        }
    }

    #[test]
    fn title_match_uses_full_title() {
        let doc = Document::paged(
            1,
            "Annual Report 2023",
            DocumentType::Pdf,
            vec![],
        );
        let report = report(&doc, "report");
        assert_eq!(
            report.title_matches,
            vec![TitleMatch {
                matched_text: "Annual Report 2023".into(),
                context: "Annual Report 2023".into(),
            }]
        );
        assert!(report.page_matches.is_empty());
        assert_eq!(report.total_matches(), 1);
    }

    #[test]
    fn long_title_is_never_truncated() {
        let title = format!("{} needle {}", "x".repeat(200), "y".repeat(200));
        let doc = Document::paged(1, title.clone(), DocumentType::Pdf, vec![]);
        let report = report(&doc, "needle");
        assert_eq!(report.title_matches.len(), 1);
        assert_eq!(report.title_matches[0].context, title);
    }

    #[test]
    fn repeated_title_hits_count_once() {
        let doc =
            Document::paged(1, "memo memo memo", DocumentType::Pdf, vec![]);
        assert_eq!(report(&doc, "memo").title_matches.len(), 1);
    }

    #[test]
    fn annotation_fields_match_independently() {
        let page = Page {
            text: None,
            jp_translation: None,
            annotations: vec![
                Annotation {
                    target_text: Some("other".into()),
                    kind: None,
                    content: None,
                },
                Annotation {
                    target_text: Some("important".into()),
                    kind: None,
                    content: Some("see important note".into()),
                },
            ],
        };
        let doc = Document::paged(1, "Notes", DocumentType::Docx, vec![page]);
        let report = report(&doc, "important");

        assert_eq!(report.page_matches.len(), 1);
        let page = &report.page_matches[0];
        assert_eq!(page.page_number, 1);
        assert_eq!(page.match_count, 2);
        assert_eq!(
            page.matches,
            vec![
                FieldMatch {
                    source: MatchSource::AnnotationName,
                    context: "#2: important".into(),
                },
                FieldMatch {
                    source: MatchSource::AnnotationContent,
                    context: "#2: see important note".into(),
                },
            ]
        );
    }

    #[test]
    fn page_sources_are_labelled_in_order() {
        let page = Page {
            text: Some("a tax form".into()),
            jp_translation: Some("tax".into()),
            annotations: vec![Annotation {
                target_text: None,
                kind: Some("Tax".into()),
                content: None,
            }],
        };
        let doc = Document::paged(
            1,
            "Forms",
            DocumentType::Pdf,
            vec![Page::with_text("nothing"), page],
        );
        let report = report(&doc, "tax");

        assert_eq!(report.page_matches.len(), 1);
        let page = &report.page_matches[0];
        assert_eq!(page.page_number, 2);
        let sources: Vec<MatchSource> =
            page.matches.iter().map(|m| m.source).collect();
        assert_eq!(
            sources,
            vec![
                MatchSource::Text,
                MatchSource::Translation,
                MatchSource::AnnotationType,
            ]
        );
        assert_eq!(page.matches[2].context, "#1: Tax");
        assert_eq!(report.total_matches(), 3);
    }

    #[test]
    fn every_page_hit_is_counted() {
        let doc = Document::paged(
            1,
            "Log",
            DocumentType::Pdf,
            vec![Page::with_text(format!(
                "error{}error",
                " ".repeat(120)
            ))],
        );
        let report = report(&doc, "error");
        assert_eq!(report.page_matches[0].match_count, 2);
        assert_eq!(report.total_matches(), 2);
    }

    #[test]
    fn missing_fields_are_not_matches() {
        let doc = Document {
            id: 1,
            title: None,
            doc_type: DocumentType::Scan(3),
            body: DocumentBody::Paged {
                pages: vec![Page {
                    text: None,
                    jp_translation: None,
                    annotations: vec![Annotation::default()],
                }],
            },
        };
        assert!(report(&doc, "anything").is_empty());
    }

    #[test]
    fn raw_pages_use_raw_window_and_skip_empty_pages() {
        let doc = Document {
            id: 9,
            title: Some("scan".into()),
            doc_type: DocumentType::Scan(3),
            body: DocumentBody::Raw {
                text: vec![
                    Some("no hit".into()),
                    None,
                    Some("the invoice total is due".into()),
                ],
            },
        };
        let matches =
            aggregate(&doc, &kw("INVOICE"), &SearchConfig::default());
        assert_eq!(
            matches,
            DocumentMatches::Raw(vec![RawPageMatches {
                page_number: 3,
                lines: vec!["the invoice total is due".into()],
            }])
        );
    }

    #[test]
    fn raw_documents_ignore_the_title() {
        let doc = Document::raw(
            2,
            "invoice.png",
            DocumentType::Scan(3),
            vec!["blank".into()],
        );
        assert!(
            aggregate(&doc, &kw("invoice"), &SearchConfig::default())
                .is_empty()
        );
    }

    #[test]
    fn match_sources_serialize_as_labels() {
        let value = serde_json::to_value(FieldMatch {
            source: MatchSource::AnnotationContent,
            context: "#1: x".into(),
        })
        .unwrap();
        assert_eq!(value["type"], "annotation_content");
        assert_eq!(MatchSource::AnnotationName.to_string(), "annotation_name");
    }
}
