//! Upload import: encode, render, then commit all-or-nothing.

mod common;

use assert_matches::assert_matches;

use pixci_codec::api::CodecApiError;
use pixci_core::error::CoreError;
use pixci_editor::error::{EditorError, ServiceError};
use pixci_editor::events::EditorEvent;

use common::{code, gated_codec_harness, harness, images, preview_of, upload, wait_until};

#[tokio::test]
async fn import_images_creates_root() {
    let h = harness();
    let mut rx = h.editor.subscribe();

    let id = h
        .editor
        .import_images(vec![upload("cat.png"), upload("dog.png")])
        .await
        .unwrap();

    let root = h.editor.current_version().unwrap();
    assert_eq!(root.id(), id);
    assert_eq!(
        root.artifact_codes(),
        vec!["<pxvg src=\"cat.png\"/>", "<pxvg src=\"dog.png\"/>"]
    );
    assert_eq!(root.previews()[1], &preview_of("<pxvg src=\"dog.png\"/>"));
    assert_eq!(root.pending_codes().len(), 2);
    assert_eq!(h.codec.encode_calls(), 2);
    assert_eq!(h.codec.decode_calls(), 2);
    assert_eq!(
        rx.try_recv().unwrap(),
        EditorEvent::Initialized {
            version_id: id,
            image_count: 2
        }
    );
}

#[tokio::test]
async fn encode_failure_commits_nothing() {
    let h = harness();

    let err = h
        .editor
        .import_images(vec![upload("cat.png"), upload("corrupt.png")])
        .await
        .unwrap_err();

    assert_matches!(
        err,
        EditorError::Service(ServiceError::Codec(CodecApiError::ApiError { status: 400, .. }))
    );
    assert!(err.to_string().contains("corrupt.png"));
    assert!(h.editor.snapshot().versions.is_empty());
    assert_eq!(h.codec.decode_calls(), 0);
}

#[tokio::test]
async fn decode_failure_commits_nothing() {
    let h = harness();
    h.editor.import_images(vec![upload("cat.png")]).await.unwrap();
    let before = h.editor.snapshot();

    let err = h
        .editor
        .import_images(vec![upload("bad.png")])
        .await
        .unwrap_err();

    assert!(err.is_service_error());
    assert_eq!(h.editor.snapshot(), before);
}

#[tokio::test]
async fn import_reference_images_appends_to_current() {
    let h = harness();
    h.editor.import_images(vec![upload("cat.png")]).await.unwrap();
    h.editor.submit_instruction("make it blue").await.unwrap();

    h.editor
        .import_reference_images(vec![upload("hat.png")])
        .await
        .unwrap();

    let current = h.editor.current_version().unwrap();
    assert_eq!(current.image_count(), 2);
    assert_eq!(current.pending_codes(), vec!["<pxvg src=\"hat.png\"/>"]);

    h.editor.submit_instruction("add the hat").await.unwrap();
    assert_eq!(
        h.gateway.last_request().reference_codes,
        vec!["<pxvg src=\"hat.png\"/>"]
    );
}

#[tokio::test]
async fn import_reference_images_requires_current_version() {
    let h = harness();

    let result = h.editor.import_reference_images(vec![upload("hat.png")]).await;

    assert_matches!(
        result,
        Err(EditorError::Validation(CoreError::NoCurrentVersion))
    );
    assert_eq!(h.codec.encode_calls(), 0);
}

#[tokio::test]
async fn reference_import_failure_leaves_version_untouched() {
    let h = harness();
    h.editor.import_images(vec![upload("cat.png")]).await.unwrap();

    h.editor
        .import_reference_images(vec![upload("hat.png"), upload("corrupt.png")])
        .await
        .unwrap_err();

    assert_eq!(h.editor.current_version().unwrap().image_count(), 1);
}

#[tokio::test]
async fn rollback_during_reference_import_discards_it() {
    let (h, gate) = gated_codec_harness();
    let (codes, previews) = images(&["cat"]);
    h.editor.initialize(codes, previews).unwrap();
    h.editor.submit_instruction("make it blue").await.unwrap();

    let editor = h.editor.clone();
    let pending =
        tokio::spawn(async move { editor.import_reference_images(vec![upload("hat.png")]).await });
    let codec = h.codec.clone();
    wait_until(|| codec.encode_calls() == 1).await;

    h.editor.rollback_to(0).unwrap();
    gate.add_permits(1);

    assert_matches!(pending.await.unwrap(), Err(EditorError::Discarded));
    let snapshot = h.editor.snapshot();
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(snapshot.versions[0].image_count(), 1);
    assert_eq!(snapshot.versions[1].image_count(), 1);
}

#[tokio::test]
async fn reinitialize_during_reference_import_discards_it() {
    let (h, gate) = gated_codec_harness();
    let (codes, previews) = images(&["cat"]);
    h.editor.initialize(codes, previews).unwrap();

    let editor = h.editor.clone();
    let pending =
        tokio::spawn(async move { editor.import_reference_images(vec![upload("hat.png")]).await });
    let codec = h.codec.clone();
    wait_until(|| codec.encode_calls() == 1).await;

    h.editor.reset_all();
    let (codes, previews) = images(&["dog"]);
    h.editor.initialize(codes, previews).unwrap();
    gate.add_permits(1);

    assert_matches!(pending.await.unwrap(), Err(EditorError::Discarded));
    let root = h.editor.current_version().unwrap();
    assert_eq!(root.artifact_codes(), vec![code("dog")]);
    assert_eq!(root.pending_codes(), vec![code("dog")]);
}

#[tokio::test]
async fn empty_upload_list_is_rejected() {
    let h = harness();

    assert_matches!(
        h.editor.import_images(vec![]).await,
        Err(EditorError::Validation(CoreError::Validation(_)))
    );
    assert_eq!(h.codec.encode_calls(), 0);
}
