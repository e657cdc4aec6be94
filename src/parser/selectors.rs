//! Declarative extraction rules for board listings
//!
//! Every board lays its listing out differently, but the shapes repeat: a
//! container found by walking a short chain of selectors, one row element per
//! notice, a title held either in an attribute or in text, a date in a cell or
//! behind a label, and a handful of attributes that encode the detail link.
//! An [`ExtractionRule`] captures one board's variant of that shape as plain
//! data; [`CompiledRule`] is the same rule with every selector parsed.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::utils::error::ParseError;

/// Parse a CSS selector, reporting the offending string on failure
pub fn parse_selector(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Where a row's title comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRule {
    /// Title element, relative to the row
    pub selector: String,

    /// Attribute read first (e.g. `title`); empty values fall through to text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,

    /// Text fallback
    #[serde(default)]
    pub text: TitleText,
}

/// Text fallback for a title
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TitleText {
    /// Attribute only
    #[default]
    None,
    /// Text of the title element itself
    Own,
    /// Text of a child of the title element
    Child { selector: String },
    /// Text of a child, or of the title element when the child is absent
    ChildOrOwn { selector: String },
}

/// Where a row's publication date comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateRule {
    /// Text of the first element matching a selector inside the row
    Selector { selector: String },

    /// Text of the row's N-th (0-based) direct child cell
    Column {
        index: usize,
        #[serde(default = "default_cell_tag")]
        cell: String,
    },

    /// Text of the value paired with a label containing `marker`
    Labeled {
        /// Label/value pair elements, relative to the row
        item: String,
        /// Label element inside a pair
        label: String,
        /// Text the label must contain (e.g. "게시일")
        marker: String,
        /// Value element inside a pair
        value: String,
    },
}

fn default_cell_tag() -> String {
    "td".to_string()
}

/// Which attributes carry the detail-link tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTokenRule {
    /// Element holding the attributes, relative to the row
    pub selector: String,

    /// Attribute names to collect (e.g. `data-id`, `href`, `onclick`)
    pub attrs: Vec<String>,
}

/// Complete extraction rule for one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// Container path; each step is looked up inside the previous match
    pub container: Vec<String>,

    /// Tag name of the container's row children (`tr` or `li`)
    pub item_tag: String,

    pub title: TitleRule,
    pub date: DateRule,

    /// Issuing department element, relative to the row (MOEF only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    pub link: LinkTokenRule,
}

impl ExtractionRule {
    /// Parse every selector of the rule
    pub fn compile(&self) -> Result<CompiledRule, ParseError> {
        if self.container.is_empty() {
            return Err(ParseError::InvalidSelector {
                selector: String::new(),
                reason: "container path is empty".to_string(),
            });
        }
        if self.item_tag.trim().is_empty() {
            return Err(ParseError::InvalidSelector {
                selector: self.item_tag.clone(),
                reason: "row tag is empty".to_string(),
            });
        }

        let container = self
            .container
            .iter()
            .map(|step| Ok((step.clone(), parse_selector(step)?)))
            .collect::<Result<Vec<_>, ParseError>>()?;

        let title_text = match &self.title.text {
            TitleText::None => CompiledTitleText::None,
            TitleText::Own => CompiledTitleText::Own,
            TitleText::Child { selector } => CompiledTitleText::Child(parse_selector(selector)?),
            TitleText::ChildOrOwn { selector } => {
                CompiledTitleText::ChildOrOwn(parse_selector(selector)?)
            }
        };

        let date = match &self.date {
            DateRule::Selector { selector } => CompiledDate::Selector(parse_selector(selector)?),
            DateRule::Column { index, cell } => CompiledDate::Column {
                index: *index,
                cell: cell.to_lowercase(),
            },
            DateRule::Labeled {
                item,
                label,
                marker,
                value,
            } => CompiledDate::Labeled {
                item: parse_selector(item)?,
                label: parse_selector(label)?,
                marker: marker.clone(),
                value: parse_selector(value)?,
            },
        };

        Ok(CompiledRule {
            container,
            item_tag: self.item_tag.to_lowercase(),
            title: parse_selector(&self.title.selector)?,
            title_attr: self.title.attr.clone(),
            title_text,
            date,
            department: self.department.as_deref().map(parse_selector).transpose()?,
            link: parse_selector(&self.link.selector)?,
            link_attrs: self.link.attrs.clone(),
        })
    }
}

/// An [`ExtractionRule`] with all selectors parsed
#[derive(Debug)]
pub struct CompiledRule {
    pub(crate) container: Vec<(String, Selector)>,
    pub(crate) item_tag: String,
    pub(crate) title: Selector,
    pub(crate) title_attr: Option<String>,
    pub(crate) title_text: CompiledTitleText,
    pub(crate) date: CompiledDate,
    pub(crate) department: Option<Selector>,
    pub(crate) link: Selector,
    pub(crate) link_attrs: Vec<String>,
}

#[derive(Debug)]
pub(crate) enum CompiledTitleText {
    None,
    Own,
    Child(Selector),
    ChildOrOwn(Selector),
}

#[derive(Debug)]
pub(crate) enum CompiledDate {
    Selector(Selector),
    Column {
        index: usize,
        cell: String,
    },
    Labeled {
        item: Selector,
        label: Selector,
        marker: String,
        value: Selector,
    },
}
