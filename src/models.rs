// Core data structures for the gongji crawler

use serde::{Deserialize, Serialize};

/// Agency whose notice board is crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// Korea Customs Service (관세청)
    Customs,
    /// National Tax Service (국세청)
    Nts,
    /// Ministry of Economy and Finance (기획재정부)
    Moef,
    /// Statistics Korea, statistical research institute (통계청)
    Kostat,
    /// Public Procurement Service (조달청)
    Pps,
}

impl SourceId {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customs => "customs",
            Self::Nts => "nts",
            Self::Moef => "moef",
            Self::Kostat => "kostat",
            Self::Pps => "pps",
        }
    }

    /// Get Korean agency name
    pub fn korean_name(&self) -> &'static str {
        match self {
            Self::Customs => "관세청",
            Self::Nts => "국세청",
            Self::Moef => "기획재정부",
            Self::Kostat => "통계청",
            Self::Pps => "조달청",
        }
    }

    /// Create from string (supports both English keys and Korean names)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "customs" | "관세청" => Some(Self::Customs),
            "nts" | "tax" | "국세청" => Some(Self::Nts),
            "moef" | "finance" | "기획재정부" | "기재부" => Some(Self::Moef),
            "kostat" | "statistics" | "통계청" => Some(Self::Kostat),
            "pps" | "procurement" | "조달청" => Some(Self::Pps),
            _ => None,
        }
    }

    /// Get all sources
    pub fn all() -> Vec<Self> {
        vec![
            Self::Customs,
            Self::Nts,
            Self::Moef,
            Self::Kostat,
            Self::Pps,
        ]
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized announcement from a board listing
///
/// Built once per listing row and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
    title: String,
    published_date: String,
    detail_url: String,
    source: SourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    department: Option<String>,
}

impl NoticeRecord {
    /// Build a record, or `None` when the title is blank
    pub fn new(
        source: SourceId,
        title: impl Into<String>,
        published_date: impl Into<String>,
        detail_url: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return None;
        }

        Some(Self {
            title,
            published_date: published_date.into().trim().to_string(),
            detail_url: detail_url.into().trim().to_string(),
            source,
            department: None,
        })
    }

    /// Attach the issuing department; blank names are ignored
    pub fn with_department(mut self, department: Option<String>) -> Self {
        self.department = department
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn published_date(&self) -> &str {
        &self.published_date
    }

    pub fn detail_url(&self) -> &str {
        &self.detail_url
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Issuing department, for boards that list one
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    /// Case-insensitive substring match on the title
    pub fn title_contains(&self, keyword: &str) -> bool {
        self.title.to_lowercase().contains(&keyword.to_lowercase())
    }
}

/// HTTP method used by a board's pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// One listing page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub source: SourceId,
    pub page: u32,
    pub method: HttpMethod,
    pub url: String,
    /// Ordered fields: query string for GET, form body for POST
    pub params: Vec<(String, String)>,
}

/// Per-source counters accumulated during one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub pages_attempted: u32,
    pub pages_succeeded: u32,
    pub pages_skipped: u32,
    /// Succeeded pages whose markup had no listing container
    pub pages_empty: u32,
    pub records_harvested: u64,
    /// The crawl stopped early because it was cancelled
    pub cancelled: bool,
}

impl CrawlSummary {
    /// Fraction of attempted pages that were fetched successfully
    pub fn success_rate(&self) -> f64 {
        if self.pages_attempted == 0 {
            0.0
        } else {
            f64::from(self.pages_succeeded) / f64::from(self.pages_attempted)
        }
    }

    /// Whether some pages were lost to upstream failures
    pub fn is_degraded(&self) -> bool {
        self.pages_skipped > 0
    }
}

/// Records and counters produced by crawling one source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceCrawl {
    pub records: Vec<NoticeRecord>,
    pub summary: CrawlSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_roundtrip() {
        for source in SourceId::all() {
            assert_eq!(SourceId::parse(source.as_str()), Some(source));
            assert_eq!(SourceId::parse(source.korean_name()), Some(source));
        }
        assert_eq!(SourceId::parse("  PPS "), Some(SourceId::Pps));
        assert_eq!(SourceId::parse("unknown"), None);
    }

    #[test]
    fn test_record_requires_title() {
        assert!(NoticeRecord::new(SourceId::Customs, "   ", "2024-01-01", "").is_none());

        let record = NoticeRecord::new(SourceId::Customs, " 공고 ", "", "").unwrap();
        assert_eq!(record.title(), "공고");
        assert_eq!(record.published_date(), "");
        assert_eq!(record.detail_url(), "");
        assert_eq!(record.department(), None);
    }

    #[test]
    fn test_department_serialized_only_when_present() {
        let plain = NoticeRecord::new(SourceId::Moef, "보도자료", "2025.01.02", "").unwrap();
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("department").is_none());

        let record = plain.with_department(Some(" 경제정책국 ".to_string()));
        assert_eq!(record.department(), Some("경제정책국"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["department"], "경제정책국");

        let blank = record.with_department(Some("  ".to_string()));
        assert_eq!(blank.department(), None);
    }

    #[test]
    fn test_title_contains_case_insensitive() {
        let record = NoticeRecord::new(SourceId::Pps, "FTA 원산지 안내", "", "").unwrap();
        assert!(record.title_contains("fta"));
        assert!(record.title_contains("원산지"));
        assert!(!record.title_contains("관세"));
    }

    #[test]
    fn test_summary_rates() {
        let summary = CrawlSummary {
            pages_attempted: 4,
            pages_succeeded: 3,
            pages_skipped: 1,
            ..Default::default()
        };
        assert!((summary.success_rate() - 0.75).abs() < f64::EPSILON);
        assert!(summary.is_degraded());
        assert_eq!(CrawlSummary::default().success_rate(), 0.0);
    }

    #[test]
    fn test_source_serde_key() {
        let json = serde_json::to_string(&SourceId::Kostat).unwrap();
        assert_eq!(json, "\"kostat\"");
    }
}
