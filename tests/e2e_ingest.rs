//! E2E tests for ingestion, video listing and snapshot history

mod common;

use chrono::{Duration, Utc};
use common::{TestServer, video_json};
use serde_json::json;

#[tokio::test]
async fn test_ingest_aggregates_account_and_tracks_growth() {
    let server = TestServer::new().await;
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);

    let report = server
        .ingest(json!([
            video_json("a1", "alice", 100),
            video_json("a2", "alice", 200),
            video_json("a3", "alice", 300),
        ]))
        .await;
    assert_eq!(report["inserted"], 3);
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);

    let accounts = server.get_json("/api/accounts").await;
    let alice = &accounts.as_array().unwrap()[0];
    assert_eq!(alice["username"], "alice");
    assert_eq!(alice["total_views"], 600);
    assert_eq!(alice["total_videos"], 3);

    server.state.snapshots.capture_all(yesterday).await.unwrap();

    let report = server
        .ingest(json!([
            video_json("a1", "alice", 150),
            video_json("a2", "alice", 250),
            video_json("a3", "alice", 300),
        ]))
        .await;
    assert_eq!(report["updated"], 3);

    server.state.snapshots.capture_all(today).await.unwrap();

    let mut growths = Vec::new();
    for id in ["a1", "a2", "a3"] {
        let history = server
            .get_json(&format!("/api/videos/tiktok/{}/history", id))
            .await;
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["views_growth"], 0);
        growths.push(history[1]["views_growth"].as_i64().unwrap());
    }
    assert_eq!(growths, vec![50, 50, 0]);
}

#[tokio::test]
async fn test_identical_record_twice_keeps_one_row() {
    let server = TestServer::new().await;

    server.ingest(json!([video_json("dup", "bob", 10)])).await;
    let first = server.get_json("/api/videos/tiktok/dup").await;
    server.ingest(json!([video_json("dup", "bob", 10)])).await;
    let second = server.get_json("/api/videos/tiktok/dup").await;

    assert_eq!(first["created_at"], second["created_at"]);
    let list = server.get_json("/api/videos").await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn test_batch_reports_invalid_records() {
    let server = TestServer::new().await;

    let report = server
        .ingest(json!([
            video_json("ok", "bob", 10),
            {"id": "", "platform": "tiktok"},
            {"id": "x", "platform": "vine"},
        ]))
        .await;

    assert_eq!(report["inserted"], 1);
    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["index"], 1);
    assert_eq!(errors[1]["index"], 2);
}

#[tokio::test]
async fn test_video_list_pagination_and_filters() {
    let server = TestServer::new().await;
    let records: Vec<_> = (0..5)
        .map(|i| video_json(&format!("v{}", i), if i % 2 == 0 { "even" } else { "odd" }, i))
        .collect();
    server.ingest(json!(records)).await;

    let page = server.get_json("/api/videos?limit=2&offset=0").await;
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["total"], 5);
    assert_eq!(page["has_more"], true);

    let last = server.get_json("/api/videos?limit=2&offset=4").await;
    assert_eq!(last["has_more"], false);

    let odd = server.get_json("/api/videos?creator=odd").await;
    assert_eq!(odd["total"], 2);

    let response = server
        .client
        .get(server.url("/api/videos?limit=500"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_spark_ad_flag_can_be_toggled() {
    let server = TestServer::new().await;
    server.ingest(json!([video_json("ad1", "brand", 1000)])).await;

    let response = server
        .client
        .patch(server.url("/api/videos/tiktok/ad1/spark-ad"))
        .json(&json!({"is_spark_ad": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let video: serde_json::Value = response.json().await.unwrap();
    assert_eq!(video["is_spark_ad"], true);

    let ads = server.get_json("/api/videos?is_spark_ad=true").await;
    assert_eq!(ads["total"], 1);

    let missing = server
        .client
        .patch(server.url("/api/videos/tiktok/missing/spark-ad"))
        .json(&json!({"is_spark_ad": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}
