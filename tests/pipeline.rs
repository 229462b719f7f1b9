//! Pipeline integration tests: ordering, skipping, fail-fast and cleanup,
//! driven through the public `Pipeline` API with in-memory stand-ins.

mod common;

use common::{config, leftovers, pipeline_with, FakePage, ScriptedOcr, PDF};
use doculoader::{LoaderError, PageMarker, Rotation, ServiceConfig};
use std::sync::Arc;
use std::time::Duration;

// ── Transcript content ───────────────────────────────────────────────────────

#[tokio::test]
async fn blank_second_page_leaves_one_marker() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new());
    let pipeline = pipeline_with(
        config(root.path()),
        vec![FakePage::text(&["Hello", "World"]), FakePage::blank()],
        ocr.clone(),
    );

    let transcript = pipeline.process(PDF).await.unwrap();

    assert_eq!(transcript.as_str(), "--- Page 1 ---\nHello\nWorld\n\n");
    assert!(!transcript.as_str().contains("--- Page 2 ---"));
    assert_eq!(ocr.calls(), vec!["1@0"]);
}

#[tokio::test]
async fn markers_count_surviving_pages_not_source_pages() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new());
    let pipeline = pipeline_with(
        config(root.path()),
        vec![
            FakePage::text(&["first"]),
            FakePage::blank(),
            FakePage::text(&["third"]),
            FakePage::blank(),
            FakePage::text(&["fifth"]),
        ],
        ocr.clone(),
    );

    let transcript = pipeline.process(PDF).await.unwrap();

    assert_eq!(
        transcript.as_str(),
        "--- Page 1 ---\nfirst\n\n--- Page 2 ---\nthird\n\n--- Page 3 ---\nfifth\n\n"
    );
    assert_eq!(transcript.source_pages(), &[1, 3, 5]);
    assert_eq!(ocr.calls(), vec!["1@0", "3@0", "5@0"]);
}

#[tokio::test]
async fn scanned_page_without_text_layer_is_kept() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new());
    let pipeline = pipeline_with(
        config(root.path()),
        vec![FakePage::blank(), FakePage::scanned(&["from the image"])],
        ocr.clone(),
    );

    let transcript = pipeline.process(PDF).await.unwrap();
    assert_eq!(transcript.as_str(), "--- Page 1 ---\nfrom the image\n\n");
    assert_eq!(transcript.source_pages(), &[2]);
}

#[tokio::test]
async fn landscape_pages_reach_ocr_upright() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new());
    let pipeline = pipeline_with(
        config(root.path()),
        vec![
            FakePage::text(&["portrait"]),
            FakePage::text(&["wide"]).landscape(),
            FakePage::text(&["already turned"])
                .landscape()
                .rotated(Rotation::Deg90),
        ],
        ocr.clone(),
    );

    pipeline.process(PDF).await.unwrap();
    assert_eq!(ocr.calls(), vec!["1@0", "2@90", "3@90"]);
}

#[tokio::test]
async fn comment_markers() {
    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .temp_root(root.path())
        .page_marker(PageMarker::Comment)
        .build()
        .unwrap();
    let pipeline = pipeline_with(
        config,
        vec![FakePage::blank(), FakePage::text(&["x"])],
        Arc::new(ScriptedOcr::new()),
    );

    let transcript = pipeline.process(PDF).await.unwrap();
    assert_eq!(transcript.as_str(), "<!-- page 1 -->\nx\n\n");
}

#[tokio::test]
async fn zero_pages_give_empty_transcript() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new());
    let pipeline = pipeline_with(config(root.path()), vec![], ocr.clone());

    let transcript = pipeline.process(PDF).await.unwrap();
    assert!(transcript.is_empty());
    assert!(ocr.calls().is_empty());
    assert_eq!(leftovers(root.path()), 0);
}

#[tokio::test]
async fn all_blank_pages_give_empty_transcript() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        config(root.path()),
        vec![FakePage::blank(), FakePage::blank()],
        Arc::new(ScriptedOcr::new()),
    );

    assert!(pipeline.process(PDF).await.unwrap().is_empty());
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ocr_failure_aborts_without_partial_transcript() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new().failing_on(2));
    let pipeline = pipeline_with(
        config(root.path()),
        vec![
            FakePage::text(&["one"]),
            FakePage::text(&["two"]),
            FakePage::text(&["three"]),
        ],
        ocr.clone(),
    );

    let err = pipeline.process(PDF).await.unwrap_err();

    assert!(
        matches!(err, LoaderError::ServiceError { page: Some(2), .. }),
        "got {err:?}"
    );
    assert!(!err.to_string().contains("one"));
    // Sequential by default: page 3 is never sent.
    assert_eq!(ocr.calls(), vec!["1@0", "2@0"]);
    assert_eq!(leftovers(root.path()), 0);
}

#[tokio::test]
async fn malformed_document_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new());
    let pipeline = pipeline_with(
        config(root.path()),
        vec![FakePage::text(&["never read"])],
        ocr.clone(),
    );

    let err = pipeline.process(b"not a pdf at all").await.unwrap_err();

    assert_eq!(err.category(), "malformed_document");
    assert!(ocr.calls().is_empty());
    assert_eq!(leftovers(root.path()), 0);
}

#[tokio::test]
async fn unconfigured_fails_before_touching_storage() {
    let root = tempfile::tempdir().unwrap();
    let scratch = root.path().join("scratch");
    let pipeline = pipeline_with(
        config(&scratch),
        vec![FakePage::text(&["x"])],
        Arc::new(ScriptedOcr::unconfigured()),
    );

    assert!(!pipeline.ocr_configured());
    let err = pipeline.process(PDF).await.unwrap_err();
    assert_eq!(err.category(), "unconfigured");
    assert!(err.to_string().contains("credentials"));
    assert!(!scratch.exists());
}

// ── Cleanup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn success_leaves_nothing_behind() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        config(root.path()),
        vec![FakePage::text(&["a"]), FakePage::text(&["b"]).landscape()],
        Arc::new(ScriptedOcr::new()),
    );

    pipeline.process(PDF).await.unwrap();
    assert_eq!(leftovers(root.path()), 0);
    assert_eq!(pipeline.cleanup_failures(), 0);
}

#[tokio::test]
async fn cleanup_failure_is_counted_not_returned() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new().wiping(root.path()));
    let pipeline = pipeline_with(
        config(root.path()),
        vec![FakePage::text(&["survives"])],
        ocr,
    );

    let transcript = pipeline.process(PDF).await.unwrap();

    assert_eq!(transcript.as_str(), "--- Page 1 ---\nsurvives\n\n");
    assert_eq!(pipeline.cleanup_failures(), 1);
}

#[tokio::test]
async fn cancelled_request_leaves_nothing_behind() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(ScriptedOcr::new().with_delay(1, 500));
    let pipeline = pipeline_with(
        config(root.path()),
        vec![FakePage::text(&["slow"]), FakePage::text(&["never reached"])],
        ocr.clone(),
    );

    let outcome =
        tokio::time::timeout(Duration::from_millis(50), pipeline.process(PDF)).await;

    assert!(outcome.is_err(), "process should still be waiting on OCR");
    assert_eq!(ocr.calls(), vec!["1@0"]);
    assert_eq!(leftovers(root.path()), 0);
    assert_eq!(pipeline.cleanup_failures(), 0);
}

#[tokio::test]
async fn requests_do_not_share_scratch_space() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = Arc::new(pipeline_with(
        config(root.path()),
        vec![FakePage::text(&["p1"]), FakePage::text(&["p2"])],
        Arc::new(ScriptedOcr::new().with_delay(1, 20)),
    ));

    let (a, b) = tokio::join!(pipeline.process(PDF), pipeline.process(PDF));
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(leftovers(root.path()), 0);
    assert_eq!(pipeline.cleanup_failures(), 0);
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_ocr_keeps_page_order() {
    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .temp_root(root.path())
        .concurrency(3)
        .build()
        .unwrap();
    // Earlier pages answer last.
    let ocr = Arc::new(
        ScriptedOcr::new()
            .with_delay(1, 60)
            .with_delay(2, 30)
            .with_delay(3, 0),
    );
    let pipeline = pipeline_with(
        config,
        vec![
            FakePage::text(&["one"]),
            FakePage::text(&["two"]),
            FakePage::text(&["three"]),
        ],
        ocr.clone(),
    );

    let transcript = pipeline.process(PDF).await.unwrap();
    assert_eq!(
        transcript.as_str(),
        "--- Page 1 ---\none\n\n--- Page 2 ---\ntwo\n\n--- Page 3 ---\nthree\n\n"
    );
    assert_eq!(ocr.calls().len(), 3);
}

#[tokio::test]
async fn concurrent_ocr_still_fails_fast() {
    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .temp_root(root.path())
        .concurrency(4)
        .build()
        .unwrap();
    let pipeline = pipeline_with(
        config,
        vec![
            FakePage::text(&["one"]),
            FakePage::text(&["two"]),
            FakePage::text(&["three"]),
        ],
        Arc::new(ScriptedOcr::new().failing_on(3)),
    );

    let err = pipeline.process(PDF).await.unwrap_err();
    assert!(matches!(err, LoaderError::ServiceError { page: Some(3), .. }));
    assert_eq!(leftovers(root.path()), 0);
}
