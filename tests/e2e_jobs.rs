//! E2E tests for ad-hoc scrape jobs and the manual daily cycle

mod common;

use common::TestServer;
use reeltrack::data::{Platform, VideoRecord};
use serde_json::json;
use std::time::Duration;

fn record(id: &str, author: &str, views: i64) -> VideoRecord {
    VideoRecord {
        id: id.to_string(),
        platform: Some(Platform::Tiktok),
        url: format!("https://www.tiktok.com/@{}/video/{}", author, id),
        author_username: Some(author.to_string()),
        views,
        ..Default::default()
    }
}

async fn wait_for_job(server: &TestServer, id: &str) -> serde_json::Value {
    for _ in 0..100 {
        let job = server.get_json(&format!("/api/jobs/{}", id)).await;
        if ["completed", "failed", "cancelled"].contains(&job["status"].as_str().unwrap()) {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {} did not finish", id);
}

#[tokio::test]
async fn test_scrape_urls_runs_background_job() {
    let server = TestServer::new().await;
    server
        .scraper
        .set_records(vec![record("101", "lena", 70), record("102", "lena", 30)]);

    let response = server
        .client
        .post(server.url("/api/scrape/urls"))
        .json(&json!({"urls": ["tt:lena", "https://www.tiktok.com/@lena/video/102"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
    let accepted: serde_json::Value = response.json().await.unwrap();
    assert_eq!(accepted["status"], "processing");
    assert_eq!(accepted["urls"].as_array().unwrap().len(), 2);

    let job = wait_for_job(&server, accepted["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["processed"], 2);

    let videos = server.get_json("/api/videos?creator=lena").await;
    assert_eq!(videos["total"], 2);

    let collections = server.get_json("/api/collections").await;
    assert_eq!(collections[0]["is_default"], true);
    assert_eq!(collections[0]["video_count"], 2);

    let jobs = server.get_json("/api/jobs").await;
    assert_eq!(jobs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_scrape_urls_rejects_unusable_input() {
    let server = TestServer::new().await;

    for body in [json!({"urls": []}), json!({"urls": ["https://example.com/video/1"]})] {
        let response = server
            .client
            .post(server.url("/api/scrape/urls"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    let response = server
        .client
        .delete(server.url("/api/jobs/unknown"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_manual_daily_cycle_rescrapes_accounts() {
    let server = TestServer::new().await;
    server
        .ingest(json!([common::video_json("201", "mia", 10)]))
        .await;
    server.scraper.set_records(vec![record("201", "mia", 250)]);

    let response = server
        .client
        .post(server.url("/api/admin/daily-cycle"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    let mut history = serde_json::Value::Null;
    for _ in 0..100 {
        history = server.get_json("/api/videos/tiktok/201/history").await;
        if !history.as_array().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["views"], 250);

    let video = server.get_json("/api/videos/tiktok/201").await;
    assert_eq!(video["views"], 250);
}
