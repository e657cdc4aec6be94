//! Listing page extraction
//!
//! Turns one board page into raw rows. Nothing here knows about URLs: link
//! attributes are collected verbatim and handed to the link resolver.

use scraper::{ElementRef, Html};
use std::collections::BTreeMap;

use crate::parser::selectors::{CompiledDate, CompiledRule, CompiledTitleText, ExtractionRule};
use crate::utils::error::ParseError;
use crate::utils::normalize_whitespace;

/// Raw fields of one listing row, before link resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Title with whitespace collapsed; never empty for emitted rows
    pub title: String,

    /// Date text as printed on the board
    pub date: String,

    /// Issuing department, when the rule names one and the row has it
    pub department: Option<String>,

    /// Attribute name to raw value, for the attributes the rule names
    pub link_tokens: BTreeMap<String, String>,
}

/// Extracts [`RawRow`]s from listing pages with a precompiled rule
#[derive(Debug)]
pub struct RecordExtractor {
    rule: CompiledRule,
}

impl RecordExtractor {
    /// Compile an extraction rule
    pub fn new(rule: &ExtractionRule) -> Result<Self, ParseError> {
        Ok(Self {
            rule: rule.compile()?,
        })
    }

    /// Extract every row with a non-empty title, in document order
    ///
    /// Returns [`ParseError::StructuralGap`] when a step of the container
    /// path is missing; callers treat that as an empty page.
    pub fn extract(&self, body: &str) -> Result<Vec<RawRow>, ParseError> {
        let document = Html::parse_document(body);
        let container = self.locate_container(&document)?;

        let rows = container
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|item| item.value().name().eq_ignore_ascii_case(&self.rule.item_tag))
            .filter_map(|item| self.extract_row(item))
            .collect();

        Ok(rows)
    }

    fn locate_container<'a>(&self, document: &'a Html) -> Result<ElementRef<'a>, ParseError> {
        let mut steps = self.rule.container.iter();

        // compile() guarantees at least one step
        let (first_step, first_sel) = steps.next().ok_or_else(|| ParseError::StructuralGap {
            step: String::new(),
        })?;
        let mut node = document
            .select(first_sel)
            .next()
            .ok_or_else(|| ParseError::StructuralGap {
                step: first_step.clone(),
            })?;

        for (step, selector) in steps {
            node = node
                .select(selector)
                .next()
                .ok_or_else(|| ParseError::StructuralGap { step: step.clone() })?;
        }

        Ok(node)
    }

    fn extract_row(&self, item: ElementRef<'_>) -> Option<RawRow> {
        let title = self.extract_title(item);
        if title.is_empty() {
            return None;
        }

        Some(RawRow {
            title,
            date: self.extract_date(item),
            department: self.extract_department(item),
            link_tokens: self.extract_link_tokens(item),
        })
    }

    fn extract_title(&self, item: ElementRef<'_>) -> String {
        let Some(node) = item.select(&self.rule.title).next() else {
            return String::new();
        };

        if let Some(attr) = &self.rule.title_attr {
            let value = node.value().attr(attr).map(normalize_whitespace);
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                return value;
            }
        }

        match &self.rule.title_text {
            CompiledTitleText::None => String::new(),
            CompiledTitleText::Own => element_text(node),
            CompiledTitleText::Child(child) => {
                node.select(child).next().map(element_text).unwrap_or_default()
            }
            CompiledTitleText::ChildOrOwn(child) => node
                .select(child)
                .next()
                .map_or_else(|| element_text(node), element_text),
        }
    }

    fn extract_date(&self, item: ElementRef<'_>) -> String {
        match &self.rule.date {
            CompiledDate::Selector(selector) => {
                item.select(selector).next().map(element_text).unwrap_or_default()
            }
            CompiledDate::Column { index, cell } => item
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| c.value().name().eq_ignore_ascii_case(cell))
                .nth(*index)
                .map(element_text)
                .unwrap_or_default(),
            CompiledDate::Labeled {
                item: pair,
                label,
                marker,
                value,
            } => item
                .select(pair)
                .find(|p| {
                    p.select(label)
                        .next()
                        .is_some_and(|l| element_text(l).contains(marker.as_str()))
                })
                .and_then(|p| p.select(value).next())
                .map(element_text)
                .unwrap_or_default(),
        }
    }

    fn extract_department(&self, item: ElementRef<'_>) -> Option<String> {
        let selector = self.rule.department.as_ref()?;
        item.select(selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
    }

    fn extract_link_tokens(&self, item: ElementRef<'_>) -> BTreeMap<String, String> {
        let Some(node) = item.select(&self.rule.link).next() else {
            return BTreeMap::new();
        };

        self.rule
            .link_attrs
            .iter()
            .filter_map(|attr| {
                node.value()
                    .attr(attr)
                    .map(|v| (attr.clone(), v.trim().to_string()))
            })
            .collect()
    }
}

/// Compile `rule` and extract `body` in one step
///
/// A structural gap yields an empty list here; only an invalid rule errors.
pub fn extract(body: &str, rule: &ExtractionRule) -> Result<Vec<RawRow>, ParseError> {
    match RecordExtractor::new(rule)?.extract(body) {
        Err(ParseError::StructuralGap { .. }) => Ok(Vec::new()),
        other => other,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}
