//! Listing extraction tests against saved board pages
//!
//! Every built-in board rule is run over a fixture of that board's markup,
//! then link tokens are resolved the way the adapter does it.

mod common;

use common::load_fixture;
use gongji::crawler::{LinkResolver, SourceConfig};
use gongji::models::SourceId;
use gongji::parser::{extract, RawRow, RecordExtractor};

fn rows(id: SourceId, fixture: &str) -> Vec<RawRow> {
    let config = SourceConfig::builtin(id);
    extract(&load_fixture(fixture), &config.rule).unwrap()
}

fn links(id: SourceId, rows: &[RawRow]) -> Vec<String> {
    let config = SourceConfig::builtin(id);
    let resolver = LinkResolver::new(&config.link, config.endpoint.as_str()).unwrap();
    rows.iter().map(|r| resolver.resolve(&r.link_tokens)).collect()
}

// ============================================================================
// Customs
// ============================================================================

#[test]
fn test_customs_template_link() {
    let rows = rows(SourceId::Customs, "customs.html");
    assert_eq!(rows.len(), 3, "ad row without a subject link is dropped");

    assert_eq!(rows[0].title, "공고");
    assert_eq!(rows[0].date, "2025-03-27");
    let links = links(SourceId::Customs, &rows);
    assert_eq!(
        links[0],
        "https://www.customs.go.kr/kcs/na/ntt/selectNttInfo.do?nttSn=123&nttSnUrl=abc"
    );
}

#[test]
fn test_customs_title_from_attribute_not_text() {
    let rows = rows(SourceId::Customs, "customs.html");
    assert_eq!(rows[1].title, "2025년 수출입 통관 지침 개정 안내");
}

#[test]
fn test_customs_missing_token_gives_empty_link() {
    let rows = rows(SourceId::Customs, "customs.html");
    let links = links(SourceId::Customs, &rows);
    assert_eq!(rows[2].title, "첨부파일 누락 공지");
    assert_eq!(links[2], "");
}

// ============================================================================
// NTS
// ============================================================================

#[test]
fn test_nts_rows() {
    let rows = rows(SourceId::Nts, "nts.html");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].title, "홈택스 시스템 점검 안내");
    assert_eq!(rows[1].date, "2025-01-14");

    let links = links(SourceId::Nts, &rows);
    assert_eq!(
        links[0],
        "https://nts.go.kr/nts/na/ntt/selectNttInfo.do?nttSn=240101&mi=2207"
    );
}

// ============================================================================
// MOEF
// ============================================================================

#[test]
fn test_moef_script_and_plain_links() {
    let rows = rows(SourceId::Moef, "moef.html");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].title, "2025년 경제정책방향 발표");
    assert_eq!(rows[0].date, "2025.01.02");
    assert_eq!(rows[0].department.as_deref(), Some("경제정책국"));
    assert_eq!(rows[1].department, None);
    assert_eq!(rows[2].department, None);

    let links = links(SourceId::Moef, &rows);
    assert_eq!(
        links[0],
        "https://www.moef.go.kr/nw/nes/detailNesDtaView.do?searchBbsId1=MOSFBBS_000000000030&searchNttId1=MOSF_000000000071234&menuNo=4050100"
    );
    assert_eq!(
        links[1],
        "https://www.moef.go.kr/nw/nes/detailNesDtaView.do?searchNttId1=MOSF_000000000071200"
    );
    assert_eq!(links[2], "", "script text is never used as a link");
}

// ============================================================================
// KOSTAT
// ============================================================================

#[test]
fn test_kostat_labeled_date() {
    let rows = rows(SourceId::Kostat, "kostat.html");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].title, "2024년 통계 연구 과제 공모");
    assert_eq!(rows[0].date, "2024-01-10");
    assert_eq!(rows[1].date, "", "row without a 게시일 label has no date");
}

#[test]
fn test_kostat_path_suffix_link() {
    let rows = rows(SourceId::Kostat, "kostat.html");
    let links = links(SourceId::Kostat, &rows);
    assert_eq!(
        links[0],
        "https://sri.kostat.go.kr/board.es?mid=a10306020000&bid=a103060100&act=view&list_no=4321"
    );
}

// ============================================================================
// PPS
// ============================================================================

#[test]
fn test_pps_viewbox_title_and_column_date() {
    let rows = rows(SourceId::Pps, "pps.html");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].title, "나라장터 시스템 개편 안내");
    assert_eq!(rows[0].date, "2025-03-27");
    assert_eq!(rows[1].title, "혁신제품 지정 공고");
}

#[test]
fn test_pps_script_call_link() {
    let rows = rows(SourceId::Pps, "pps.html");
    let links = links(SourceId::Pps, &rows);
    assert_eq!(
        links[0],
        "https://www.pps.go.kr/kor/bbs/view.do?bbsSn=2503270008&key=00641"
    );
    assert_eq!(links[2], "", "call with the wrong arity does not match");
}

// ============================================================================
// Structural gaps
// ============================================================================

#[test]
fn test_missing_container_is_empty_not_error() {
    for id in SourceId::all() {
        let config = SourceConfig::builtin(id);
        let rows = extract("<html><body><p>점검 중입니다</p></body></html>", &config.rule);
        assert_eq!(rows.unwrap(), Vec::new(), "{id}");
    }
}

#[test]
fn test_extractor_reports_gap() {
    let config = SourceConfig::builtin(SourceId::Nts);
    let extractor = RecordExtractor::new(&config.rule).unwrap();
    let err = extractor
        .extract(r#"<div class="bbs_ListA"><p>no table</p></div>"#)
        .unwrap_err();
    assert!(err.is_structural_gap());
}

#[test]
fn test_fixture_for_other_board_yields_nothing() {
    let rows = rows(SourceId::Pps, "moef.html");
    assert!(rows.is_empty());
}
