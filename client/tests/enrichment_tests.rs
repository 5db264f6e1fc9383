//! Domain enrichment against stubbed HTTP services.

mod common;

use chrono::NaiveDate;
use common::{config_for, http_mock::MockHttpServer};
use parley_client::domains::{Bills, Committees, Divisions, House};
use parley_client::query::QueryParams;
use parley_client::ParleyError;
use serde_json::json;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// An unknown house fails before any HTTP traffic.
#[tokio::test]
async fn test_invalid_house_fails_before_any_request() {
    let server = MockHttpServer::start().await;
    let config = config_for(&server.url());

    let result = Divisions::connect("upper", &config);

    assert!(matches!(result, Err(ParleyError::Configuration(_))));
    assert_eq!(server.received_count().await, 0);
}

#[tokio::test]
async fn test_house_is_case_insensitive() {
    let server = MockHttpServer::start().await;
    let config = config_for(&server.url());

    let divisions = Divisions::connect("COMMONS", &config).expect("valid house");
    assert_eq!(divisions.house(), House::Commons);
}

/// Commons divisions gain Ayes/Noes from one detail request each, in order,
/// even when detail requests run concurrently.
#[tokio::test]
async fn test_commons_divisions_enriched_with_bounded_fan_out() {
    let server = MockHttpServer::start().await;

    server
        .expect_get("/divisions.json/search")
        .with_query("startDate", "2024-01-15")
        .with_query("endDate", "2024-01-19")
        .with_query("includeWhenMemberWasTeller", "true")
        .respond_with_json(json!([
            {"DivisionId": 1, "Title": "First"},
            {"DivisionId": 2, "Title": "Second"},
            {"DivisionId": 3, "Title": "Third"}
        ]))
        .expect_times(1)
        .mount()
        .await;
    for id in 1..=3 {
        server
            .expect_get(&format!("/division/{id}.json"))
            .respond_with_json(json!({
                "DivisionId": id,
                "Ayes": [{"MemberId": id * 10}],
                "Noes": [{"MemberId": id * 100}]
            }))
            .respond_with_delay(std::time::Duration::from_millis(60 - id * 15))
            .expect_times(1)
            .mount()
            .await;
    }

    let mut config = config_for(&server.url());
    config.fan_out.concurrency = 3;
    let divisions = Divisions::connect("Commons", &config).expect("valid house");

    let result = divisions
        .get_divisions(date(2024, 1, 15), date(2024, 1, 19))
        .await
        .expect("should fetch divisions");

    let titles: Vec<_> = result.iter().map(|d| d["Title"].clone()).collect();
    assert_eq!(titles, vec![json!("First"), json!("Second"), json!("Third")]);
    assert_eq!(result[1]["Ayes"], json!([{"MemberId": 20}]));
    assert_eq!(result[2]["Noes"], json!([{"MemberId": 300}]));
    server.verify().await;
}

#[tokio::test]
async fn test_lords_divisions_not_enriched() {
    let server = MockHttpServer::start().await;

    server
        .expect_get("/Divisions/search")
        .respond_with_json(json!([{"divisionId": 7, "title": "Lords amendment"}]))
        .expect_times(1)
        .mount()
        .await;

    let divisions = Divisions::connect("lords", &config_for(&server.url())).expect("valid house");
    let result = divisions
        .get_divisions(date(2024, 2, 1), date(2024, 2, 2))
        .await
        .expect("should fetch divisions");

    assert_eq!(result, vec![json!({"divisionId": 7, "title": "Lords amendment"})]);
    assert_eq!(server.received_count().await, 1);
}

/// Committee members are tagged with their committee and flattened in
/// committee-then-member order.
#[tokio::test]
async fn test_committee_members_tagged_and_flattened() {
    let server = MockHttpServer::start().await;

    server
        .expect_get("/Committees")
        .with_query("Skip", "0")
        .with_query("Take", "30")
        .respond_with_json(json!({"items": [{"id": 101}, {"id": 202}], "totalResults": 2}))
        .mount()
        .await;
    server
        .expect_get("/Committees/101/Members")
        .respond_with_json(json!({"items": [{"personId": 1}]}))
        .mount()
        .await;
    server
        .expect_get("/Committees/202/Members")
        .respond_with_json(json!({"items": [{"personId": 2}, {"personId": 3}]}))
        .mount()
        .await;

    let committees = Committees::connect(&config_for(&server.url())).expect("client builds");
    let members = committees
        .get_all_members(&QueryParams::new())
        .await
        .expect("should fetch members");

    assert_eq!(
        members,
        vec![
            json!({"personId": 1, "committeeId": 101}),
            json!({"personId": 2, "committeeId": 202}),
            json!({"personId": 3, "committeeId": 202}),
        ]
    );
}

/// A failed detail request aborts the whole enrichment with no partial list.
#[tokio::test]
async fn test_bill_detail_failure_aborts() {
    let server = MockHttpServer::start().await;

    server
        .expect_get("/v1/Bills")
        .respond_with_json(json!({"items": [{"billId": 1}, {"billId": 2}, {"billId": 3}]}))
        .mount()
        .await;
    server
        .expect_get("/v1/Bills/1")
        .respond_with_json(json!({"billId": 1, "shortTitle": "Ok"}))
        .mount()
        .await;
    server
        .expect_get("/v1/Bills/2")
        .respond_with_status(500)
        .mount()
        .await;

    let bills = Bills::connect(&config_for(&server.url())).expect("client builds");
    let result = bills.get_bills(&QueryParams::new()).await;

    assert!(matches!(result, Err(ParleyError::Http { status: 500, .. })));
    // Sequential fan-out never reaches the third bill.
    assert_eq!(
        server.received_targets().await,
        vec!["/v1/Bills?Skip=0&Take=999", "/v1/Bills/1", "/v1/Bills/2"]
    );
}
