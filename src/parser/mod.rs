//! HTML parsing and row extraction
//!
//! This module turns listing pages into raw rows according to a per-board
//! [`ExtractionRule`].

pub mod listing;
pub mod selectors;

pub use listing::{extract, RawRow, RecordExtractor};
pub use selectors::{DateRule, ExtractionRule, LinkTokenRule, TitleRule, TitleText};
