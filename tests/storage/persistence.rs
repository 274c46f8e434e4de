//! Durability checks: the per-type ring buffer and pipeline writes must
//! survive a reopen of the same database file.

use std::sync::Arc;

use super::fakes::{self, CountingText, LONG_REPLY};
use reach::pipeline::ContentRequest;
use reach::router::ContentType;
use reach::storage::ContentStore;

#[tokio::test]
async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content.db");

    {
        let store = ContentStore::open(&path).await.unwrap();
        for i in 0..6 {
            store
                .save("s1", ContentType::Blog, &format!("post {i}"), None, None)
                .await
                .unwrap();
        }
        store
            .save("s1", ContentType::Linkedin, "one linkedin post", None, None)
            .await
            .unwrap();
    }

    let reopened = ContentStore::open(&path).await.unwrap();
    assert_eq!(reopened.count(Some(ContentType::Blog)).await.unwrap(), 5);
    assert_eq!(
        reopened.count(Some(ContentType::Linkedin)).await.unwrap(),
        1
    );

    let recent = reopened
        .recent(Some(ContentType::Blog), 10, None)
        .await
        .unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0].content, "post 5");
    // The oldest blog post fell out of the five-slot ring.
    assert!(recent.iter().all(|record| record.content != "post 0"));
}

#[tokio::test]
async fn pipeline_runs_persist_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content.db");

    let text = CountingText::new(LONG_REPLY);
    let (pipeline, _sessions) = fakes::pipeline(text);
    let pipeline = pipeline.with_store(Arc::new(ContentStore::open(&path).await.unwrap()));

    let response = pipeline
        .process(
            ContentRequest::new("home staging advice for sellers")
                .with_session("s1")
                .with_content_type(ContentType::Linkedin),
        )
        .await;
    assert!(response.success, "error: {:?}", response.error);

    let reopened = ContentStore::open(&path).await.unwrap();
    let records = reopened.recent(None, 10, None).await.unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.session_id, "s1");
    assert_eq!(record.content_type, ContentType::Linkedin);
    assert_eq!(record.content, LONG_REPLY);
    assert_eq!(
        record.prompt.as_deref(),
        Some("home staging advice for sellers")
    );

    let metadata = record.metadata.as_ref().unwrap();
    assert_eq!(metadata["agent_used"], "linkedin_writer_agent");
    assert_eq!(metadata["routing"]["confidence"], 1.0);
}
