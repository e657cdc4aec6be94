//! Board definitions
//!
//! A [`SourceConfig`] is everything needed to crawl one agency's board:
//! where to send requests, how pages are selected, how rows are laid out and
//! how detail links are encoded. The five built-in boards differ only in
//! these values; [`SourceConfig::builtin`] returns them and a TOML file can
//! replace any of them wholesale.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

use crate::crawler::headers::{
    board_header_pairs, build_board_headers, BASIC_USER_AGENT, CHROME_USER_AGENT,
};
use crate::crawler::link::{LinkResolver, LinkStrategy};
use crate::models::{HttpMethod, SourceId};
use crate::parser::selectors::{DateRule, ExtractionRule, LinkTokenRule, TitleRule, TitleText};
use crate::utils::error::CrawlerError;
use crate::utils::retry::{Attempts, RetryPolicy};

/// Static crawl definition for one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: SourceId,

    /// Listing endpoint; may already carry a query string
    pub endpoint: String,

    pub method: HttpMethod,

    /// Fixed request fields, sent in this order before the page field
    #[serde(default)]
    pub payload: Vec<(String, String)>,

    /// Name of the field carrying the page number
    pub page_field: String,

    /// First page (1-based, inclusive)
    pub first_page: u32,

    /// Last page (inclusive)
    pub last_page: u32,

    /// Extra request headers (user agent, referer)
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    pub rule: ExtractionRule,

    pub link: LinkStrategy,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Pause between two pages, in milliseconds
    #[serde(default)]
    pub page_delay_ms: u64,
}

impl SourceConfig {
    /// Inclusive page range
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.first_page..=self.last_page
    }

    /// Number of pages in the range
    pub fn page_count(&self) -> u32 {
        self.last_page.saturating_sub(self.first_page).saturating_add(1)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Point the config at another host, keeping path and query
    ///
    /// Used to aim a built-in board at a local server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, CrawlerError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| CrawlerError::invalid_config(self.id, format!("endpoint: {e}")))?;
        let mut rebased = Url::parse(base_url)
            .map_err(|e| CrawlerError::invalid_config(self.id, format!("base url: {e}")))?;
        rebased.set_path(endpoint.path());
        rebased.set_query(endpoint.query());
        self.endpoint = rebased.to_string();
        Ok(self)
    }

    /// Cap the last page so at most `max_pages` pages are crawled
    #[must_use]
    pub fn limit_pages(mut self, max_pages: u32) -> Self {
        if max_pages > 0 {
            let capped = self.first_page.saturating_add(max_pages - 1);
            self.last_page = self.last_page.min(capped);
        }
        self
    }

    /// Check the config is structurally usable
    ///
    /// Selectors, link patterns and headers are compiled here so a broken
    /// definition fails before any request is sent.
    pub fn validate(&self) -> Result<(), CrawlerError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(CrawlerError::invalid_config(self.id, "endpoint is empty"));
        }
        Url::parse(endpoint)
            .map_err(|e| CrawlerError::invalid_config(self.id, format!("endpoint: {e}")))?;

        if self.first_page < 1 {
            return Err(CrawlerError::invalid_config(
                self.id,
                "first_page must be at least 1",
            ));
        }
        if self.first_page > self.last_page {
            return Err(CrawlerError::invalid_config(
                self.id,
                format!(
                    "page range {}..={} is empty",
                    self.first_page, self.last_page
                ),
            ));
        }
        if self.page_field.trim().is_empty() {
            return Err(CrawlerError::invalid_config(self.id, "page_field is empty"));
        }
        if self.retry.attempts == Attempts::Unbounded && self.retry.delay_ms == 0 {
            return Err(CrawlerError::invalid_config(
                self.id,
                "unbounded retry needs a non-zero delay_ms",
            ));
        }

        self.rule.compile().map_err(|e| (self.id, e))?;
        LinkResolver::new(&self.link, endpoint).map_err(|e| (self.id, e))?;
        build_board_headers(&self.headers, "")
            .map_err(|e| CrawlerError::invalid_config(self.id, e))?;

        Ok(())
    }

    /// Built-in definition for a board
    pub fn builtin(id: SourceId) -> Self {
        match id {
            SourceId::Customs => customs(),
            SourceId::Nts => nts(),
            SourceId::Moef => moef(),
            SourceId::Kostat => kostat(),
            SourceId::Pps => pps(),
        }
    }

    /// Built-in definitions for every board, in [`SourceId::all`] order
    pub fn builtins() -> Vec<Self> {
        SourceId::all().into_iter().map(Self::builtin).collect()
    }
}

fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn customs() -> SourceConfig {
    let subject = r#"td[data-table="subject"] a"#;

    SourceConfig {
        id: SourceId::Customs,
        endpoint: "https://www.customs.go.kr/kcs/na/ntt/selectNttList.do".to_string(),
        method: HttpMethod::Post,
        payload: fields(&[
            ("confmUseAt", "N"),
            ("bbsId", "1341"),
            ("minSn", "0"),
            ("menuId", "2889"),
            ("newHour", "24"),
            ("cntntsId", "1341"),
            ("maxSn", "10"),
            ("manageAt", "N"),
            ("sysId", "kcs"),
            ("menuTy", "BBS"),
            ("listUseAt", "Y"),
            ("bbsTy", "NORMAL"),
            ("useAt", "Y"),
            ("mi", "2889"),
            ("noticeAt", "Y"),
        ]),
        page_field: "currPage".to_string(),
        first_page: 1,
        last_page: 150,
        headers: board_header_pairs(
            BASIC_USER_AGENT,
            Some("https://www.customs.go.kr/kcs/na/ntt/selectNttList.do?mi=2889&bbsId=1341"),
        ),
        rule: ExtractionRule {
            container: vec!["table.bbsList".to_string(), "tbody".to_string()],
            item_tag: "tr".to_string(),
            title: TitleRule {
                selector: subject.to_string(),
                attr: Some("title".to_string()),
                text: TitleText::None,
            },
            date: DateRule::Selector {
                selector: r#"td[data-table="date"]"#.to_string(),
            },
            department: None,
            link: LinkTokenRule {
                selector: subject.to_string(),
                attrs: vec!["data-id".to_string(), "data-url".to_string()],
            },
        },
        link: LinkStrategy::Template {
            template: "https://www.customs.go.kr/kcs/na/ntt/selectNttInfo.do?nttSn={data-id}&nttSnUrl={data-url}".to_string(),
        },
        retry: RetryPolicy::default(),
        page_delay_ms: 500,
    }
}

fn nts() -> SourceConfig {
    let subject = r#"td.bbs_tit[data-table="subject"] a.nttInfoBtn"#;

    SourceConfig {
        id: SourceId::Nts,
        endpoint: "https://www.nts.go.kr/nts/na/ntt/selectNttList.do".to_string(),
        method: HttpMethod::Post,
        payload: fields(&[
            ("listUseAt", "Y"),
            ("manageAt", "N"),
            ("confmUseAt", "N"),
            ("transIp", "https://doc.nts.go.kr:8080"),
            ("bbsTy", "NORMAL"),
            ("newHour", "24"),
            ("maxSn", "10"),
            ("authorAt", "N"),
            ("noticeAt", "Y"),
            ("synapViewerAt", "Y"),
            ("mi", "2207"),
            ("filepathIp", "http://www.nts.go.kr"),
            ("useAt", "Y"),
            ("minSn", "0"),
            ("bbsId", "1011"),
        ]),
        page_field: "currPage".to_string(),
        first_page: 1,
        last_page: 59,
        headers: board_header_pairs(
            CHROME_USER_AGENT,
            Some("https://www.nts.go.kr/nts/na/ntt/selectNttList.do?mi=2207&bbsId=1011"),
        ),
        rule: ExtractionRule {
            container: vec![
                "div.bbs_ListA".to_string(),
                "table".to_string(),
                "tbody".to_string(),
            ],
            item_tag: "tr".to_string(),
            title: TitleRule {
                selector: subject.to_string(),
                attr: Some("title".to_string()),
                text: TitleText::None,
            },
            date: DateRule::Selector {
                selector: r#"td[data-table="date"]"#.to_string(),
            },
            department: None,
            link: LinkTokenRule {
                selector: subject.to_string(),
                attrs: vec!["data-id".to_string()],
            },
        },
        link: LinkStrategy::Template {
            template: "https://nts.go.kr/nts/na/ntt/selectNttInfo.do?nttSn={data-id}&mi=2207"
                .to_string(),
        },
        retry: RetryPolicy::default(),
        page_delay_ms: 0,
    }
}

fn moef() -> SourceConfig {
    SourceConfig {
        id: SourceId::Moef,
        endpoint: "https://www.moef.go.kr/nw/nes/nesdta.do".to_string(),
        method: HttpMethod::Get,
        payload: fields(&[
            ("searchBbsId", "MOSFBBS_000000000030"),
            ("menuNo", "4050100"),
        ]),
        page_field: "pageIndex".to_string(),
        first_page: 1,
        last_page: 80,
        headers: board_header_pairs(CHROME_USER_AGENT, None),
        rule: ExtractionRule {
            container: vec!["ul.boardType3".to_string()],
            item_tag: "li".to_string(),
            title: TitleRule {
                selector: "h3 a".to_string(),
                attr: None,
                text: TitleText::Own,
            },
            date: DateRule::Selector {
                selector: "span.date".to_string(),
            },
            department: Some("span.depart".to_string()),
            link: LinkTokenRule {
                selector: "h3 a".to_string(),
                attrs: vec!["href".to_string()],
            },
        },
        link: LinkStrategy::ScriptCall {
            token: "href".to_string(),
            function: "fn_egov_select".to_string(),
            arity: 2,
            template: "https://www.moef.go.kr/nw/nes/detailNesDtaView.do?searchBbsId1={1}&searchNttId1={0}&menuNo=4050100".to_string(),
            marker: Some("javascript:".to_string()),
        },
        retry: RetryPolicy::unbounded(Duration::from_secs(5)),
        page_delay_ms: 0,
    }
}

fn kostat() -> SourceConfig {
    SourceConfig {
        id: SourceId::Kostat,
        endpoint: "https://sri.kostat.go.kr/board.es?mid=a10306020000&bid=a103060100&ref_bid=106,108"
            .to_string(),
        method: HttpMethod::Post,
        payload: fields(&[
            ("mid", "a10306020000"),
            ("bid", "a103060100"),
            ("b_list", "10"),
            ("orderby", ""),
            ("dept_code", ""),
            ("tag", ""),
            ("list_no", ""),
            ("act", "list"),
            ("actionURL", "/board.es?mid=a10306020000&bid=a103060100"),
            ("ref_bid", "106,108"),
        ]),
        page_field: "nPage".to_string(),
        first_page: 1,
        last_page: 39,
        headers: board_header_pairs(BASIC_USER_AGENT, None),
        rule: ExtractionRule {
            container: vec!["div.board_list_01".to_string(), "ul".to_string()],
            item_tag: "li".to_string(),
            title: TitleRule {
                selector: "a.board_link".to_string(),
                attr: None,
                text: TitleText::Child {
                    selector: "span".to_string(),
                },
            },
            date: DateRule::Labeled {
                item: "div.board_class ul li".to_string(),
                label: "strong".to_string(),
                marker: "게시일".to_string(),
                value: "span".to_string(),
            },
            department: None,
            link: LinkTokenRule {
                selector: "a.board_link".to_string(),
                attrs: vec!["href".to_string()],
            },
        },
        link: LinkStrategy::PathSuffix {
            token: "href".to_string(),
            function: "addSearchParam".to_string(),
            base: "https://sri.kostat.go.kr/".to_string(),
        },
        retry: RetryPolicy::default(),
        page_delay_ms: 0,
    }
}

fn pps() -> SourceConfig {
    SourceConfig {
        id: SourceId::Pps,
        endpoint: "https://www.pps.go.kr/kor/bbs/list.do".to_string(),
        method: HttpMethod::Get,
        payload: fields(&[("key", "00641")]),
        page_field: "pageIndex".to_string(),
        first_page: 1,
        last_page: 175,
        headers: board_header_pairs(CHROME_USER_AGENT, None),
        rule: ExtractionRule {
            container: vec!["div.board_list".to_string(), "tbody".to_string()],
            item_tag: "tr".to_string(),
            title: TitleRule {
                selector: "td.title".to_string(),
                attr: None,
                text: TitleText::ChildOrOwn {
                    selector: "div.viewbox".to_string(),
                },
            },
            date: DateRule::Column {
                index: 4,
                cell: "td".to_string(),
            },
            department: None,
            link: LinkTokenRule {
                selector: "td.title a".to_string(),
                attrs: vec!["onclick".to_string()],
            },
        },
        link: LinkStrategy::ScriptCall {
            token: "onclick".to_string(),
            function: "goView".to_string(),
            arity: 2,
            template: "https://www.pps.go.kr/kor/bbs/view.do?bbsSn={0}&key=00641".to_string(),
            marker: None,
        },
        retry: RetryPolicy::default(),
        page_delay_ms: 0,
    }
}
