//! Common test utilities

use std::fs;
use std::time::Duration;

use gongji::crawler::SourceConfig;
use gongji::models::SourceId;
use gongji::utils::retry::RetryPolicy;

/// Test fixture paths
pub const FIXTURES_DIR: &str = "tests/fixtures/html";

#[allow(dead_code)]
pub fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

/// Built-in board aimed at a mock server, with fast retries and no page delay
#[allow(dead_code)]
pub fn local_board(id: SourceId, base_url: &str, pages: u32, attempts: u32) -> SourceConfig {
    let mut config = SourceConfig::builtin(id)
        .with_base_url(base_url)
        .expect("mock server uri should parse")
        .limit_pages(pages);
    config.retry = RetryPolicy::bounded(attempts, Duration::from_millis(5));
    config.page_delay_ms = 0;
    config
}

/// Listing page with a single customs-style row
#[allow(dead_code)]
pub fn customs_page(id: &str, title: &str) -> String {
    format!(
        r##"<html><body><table class="bbsList"><tbody>
<tr>
  <td data-table="subject"><a href="#" data-id="{id}" data-url="u{id}" title="{title}">{title}</a></td>
  <td data-table="date">2025-03-01</td>
</tr>
</tbody></table></body></html>"##
    )
}
