//! Block/line/span layout tree.
//!
//! Produced from `pdftotext -bbox-layout`, which emits XHTML of the form
//! `<page><flow><block><line><word>..</word></line></block></flow></page>`.
//! Each `<word>` becomes a [`Span`]; words after the first in a line carry
//! a leading space so concatenating a line's spans reproduces the text as
//! it reads on the page.

use scraper::{Html, Selector};

use crate::PdfError;

/// A contiguous text region on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// Lines in reading order.
    pub lines: Vec<Line>,
}

/// A single visual line inside a [`Block`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    /// Text runs in reading order.
    pub spans: Vec<Span>,
}

/// A run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    /// The run's text.
    pub text: String,
}

impl Line {
    /// Concatenates the text of every span.
    #[must_use]
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Parses a CSS selector, returning a [`PdfError`] on failure.
fn parse_selector(selector: &str) -> Result<Selector, PdfError> {
    Selector::parse(selector)
        .map_err(|e| PdfError::Layout(format!("invalid selector '{selector}': {e}")))
}

/// Parses `pdftotext -bbox-layout` output for the first page.
///
/// # Errors
///
/// Returns [`PdfError::Layout`] if the document has no `<page>` element.
pub fn parse_bbox_layout(xhtml: &str) -> Result<Vec<Block>, PdfError> {
    let document = Html::parse_document(xhtml);

    let page_sel = parse_selector("page")?;
    let block_sel = parse_selector("block")?;
    let line_sel = parse_selector("line")?;
    let word_sel = parse_selector("word")?;

    let page = document
        .select(&page_sel)
        .next()
        .ok_or_else(|| PdfError::Layout("no <page> element in layout output".to_owned()))?;

    let blocks: Vec<Block> = page
        .select(&block_sel)
        .map(|block| Block {
            lines: block
                .select(&line_sel)
                .map(|line| Line {
                    spans: line
                        .select(&word_sel)
                        .enumerate()
                        .map(|(i, word)| {
                            let text: String = word.text().collect();
                            let text = text.trim();
                            Span {
                                text: if i == 0 {
                                    text.to_owned()
                                } else {
                                    format!(" {text}")
                                },
                            }
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    log::debug!("Parsed {} layout block(s)", blocks.len());

    Ok(blocks)
}
