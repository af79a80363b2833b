#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Editor session tests.
//!
//! Drives the media actions against the in-memory surface with a
//! recording gateway and checks document, guard, dialog and sync state.

use std::time::Duration;

use trovato_media_editor::config::Settings;
use trovato_media_editor::dialog::DialogState;
use trovato_media_editor::dom::MAX_NESTING_DEPTH;
use trovato_media_editor::surface::NoticeLevel;
use trovato_media_editor::{
    ActionOutcome, DeleteOutcome, EditorOptions, EditorSession, EditorSurface, GuardState,
    IgnoreReason, InsertOutcome, MediaAction, MemoryEditor,
};
use trovato_test_utils::{
    GatewayCall, RecordingGateway, RecordingSink, STORAGE_ORIGIN, assert, docs, media,
};

fn session_with(
    content: &str,
    gateway: &RecordingGateway,
    sink: &RecordingSink,
) -> EditorSession<MemoryEditor> {
    let options = EditorOptions::new()
        .content(content)
        .gateway(gateway.clone())
        .on_change(sink.sink())
        .storage(STORAGE_ORIGIN)
        .content_id("doc-1");
    EditorSession::new(MemoryEditor::new(), options)
}

fn doc_id() -> Option<String> {
    Some("doc-1".to_string())
}

#[test]
fn test_session_registers_media_actions() {
    let session = EditorSession::new(
        MemoryEditor::new(),
        EditorOptions::new().content("<p>hello</p>"),
    );
    let surface = session.lock_surface();
    let names: Vec<&str> = surface.buttons().iter().map(|b| b.name).collect();
    assert_eq!(names, vec!["videoUpload", "deleteImage", "deleteVideo"]);
    assert_eq!(surface.serialize(), "<p>hello</p>");
    assert!(!surface.is_read_only());
}

#[test]
fn test_init_options_follow_configuration() {
    let session = EditorSession::new(MemoryEditor::new(), EditorOptions::new());
    let options = session.init_options();
    assert_eq!(options["height"], "300px");
    assert::contains(options["toolbar"].as_str().unwrap(), "videoUpload deleteVideo deleteImage");
}

#[tokio::test]
async fn test_delete_image_from_storage_origin() {
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let session = session_with(&docs::with_stored_image("abc123.png"), &gateway, &sink);
    session.lock_surface().select_tag("img");

    let outcome = session.delete_image().await.unwrap();

    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            asset_id: "abc123.png".to_string()
        }
    );
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::DeleteImage {
            asset_id: "abc123.png".to_string(),
            content_id: doc_id(),
        }]
    );
    assert_eq!(session.document(), "<p>before</p><p>after</p>");
    assert_eq!(sink.count(), 1);
    assert_eq!(sink.last().as_deref(), Some("<p>before</p><p>after</p>"));
    assert_eq!(session.guard().state(), GuardState::Idle);
}

#[tokio::test]
async fn test_delete_image_from_foreign_origin_is_ignored() {
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let content = docs::with_image("https://other.com/x.png");
    let session = session_with(&content, &gateway, &sink);
    session.lock_surface().select_tag("img");

    let outcome = session.delete_image().await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Ignored(IgnoreReason::ForeignOrigin));
    assert_eq!(gateway.call_count(), 0);
    assert::contains(&session.document(), "https://other.com/x.png");
    assert_eq!(sink.count(), 0);
    assert!(!session.guard().is_deleting());
}

#[tokio::test]
async fn test_delete_image_requires_storage_origin() {
    let gateway = RecordingGateway::new();
    let session = EditorSession::new(
        MemoryEditor::new(),
        EditorOptions::new()
            .content(docs::with_stored_image("abc.png"))
            .gateway(gateway.clone()),
    );
    session.lock_surface().select_tag("img");

    let outcome = session.delete_image().await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Ignored(IgnoreReason::NoStorageOrigin));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_delete_image_ignores_non_image_selection() {
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let session = session_with(&docs::with_stored_image("abc.png"), &gateway, &sink);
    session.lock_surface().select_tag("p");

    let outcome = session.delete_image().await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Ignored(IgnoreReason::NotAnImage));

    session.lock_surface().clear_selection();
    let outcome = session.delete_image().await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Ignored(IgnoreReason::NothingSelected));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_failed_delete_keeps_node_and_clears_guard() {
    let gateway = RecordingGateway::new().reject_deletes("backend unavailable");
    let sink = RecordingSink::new();
    let content = docs::with_stored_image("abc.png");
    let session = session_with(&content, &gateway, &sink);
    session.lock_surface().select_tag("img");
    let before = session.document();

    let err = session.delete_image().await.unwrap_err();

    assert!(err.is_delete_failure());
    assert_eq!(session.document(), before);
    assert_eq!(sink.count(), 0);
    assert_eq!(session.guard().state(), GuardState::Idle);

    let surface = session.lock_surface();
    assert!(!surface.is_read_only());
    assert_eq!(surface.notices().len(), 1);
    assert_eq!(surface.notices()[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_delete_timeout_resets_guard() {
    let gateway = RecordingGateway::held();
    let sink = RecordingSink::new();
    let options = EditorOptions::new()
        .content(docs::with_video("v1"))
        .gateway(gateway.clone())
        .on_change(sink.sink())
        .gateway_timeout(Duration::from_millis(20));
    let session = EditorSession::new(MemoryEditor::new(), options);
    session.lock_surface().select_tag("video");

    let err = session.delete_video().await.unwrap_err();

    assert!(err.is_delete_failure());
    assert_eq!(err.to_string(), "delete_video timed out after 0s");
    assert_eq!(session.guard().state(), GuardState::Idle);
    assert!(!session.lock_surface().is_read_only());
    assert::contains(&session.document(), "video-wrapper");
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn test_delete_video_removes_wrapper() {
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let session = session_with(&docs::with_video("v1"), &gateway, &sink);
    session.lock_surface().select_tag("video");

    let outcome = session.delete_video().await.unwrap();

    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            asset_id: "v1".to_string()
        }
    );
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::DeleteVideo {
            asset_id: "v1".to_string(),
            content_id: doc_id(),
        }]
    );
    assert_eq!(session.document(), "<p>intro</p><p>outro</p>");
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn test_delete_video_uses_fallback_id() {
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let content = r#"<div class="video-wrapper"><img class="mce-object-video" data-mce-p-id="v7" src="placeholder.gif"></div><p>x</p>"#;
    let session = session_with(content, &gateway, &sink);
    session.lock_surface().select_tag("img");

    let outcome = session.delete_video().await.unwrap();

    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            asset_id: "v7".to_string()
        }
    );
    assert_eq!(session.document(), "<p>x</p>");
}

#[tokio::test]
async fn test_delete_video_outside_wrapper_is_ignored() {
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let session = session_with(r#"<video id="v1"></video>"#, &gateway, &sink);
    session.lock_surface().select_tag("video");

    let outcome = session.delete_video().await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Ignored(IgnoreReason::NoVideoWrapper));
    assert_eq!(gateway.call_count(), 0);
    assert_eq!(session.document(), r#"<video id="v1"></video>"#);
}

#[tokio::test]
async fn test_concurrent_delete_is_busy() {
    let gateway = RecordingGateway::held();
    let sink = RecordingSink::new();
    let content = format!("{}{}", docs::with_stored_image("abc.png"), docs::with_video("v1"));
    let session = session_with(&content, &gateway, &sink);
    session.lock_surface().select_tag("img");

    let first = session.delete_image();
    let second = async {
        gateway.wait_for_calls(1).await;
        assert!(session.guard().is_deleting());
        assert!(session.lock_surface().is_read_only());
        session.lock_surface().select_tag("video");
        let outcome = session.delete_video().await.unwrap();
        gateway.release(1);
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(
        first.unwrap(),
        DeleteOutcome::Deleted {
            asset_id: "abc.png".to_string()
        }
    );
    assert_eq!(second, DeleteOutcome::Busy);
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(sink.count(), 1);
    assert::contains(&session.document(), "video-wrapper");
    assert_eq!(session.guard().state(), GuardState::Idle);
}

#[tokio::test]
async fn test_insert_video_builds_container() {
    let gateway = RecordingGateway::new().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);
    session.lock_surface().place_caret_at_end();

    let opened = session.dispatch(MediaAction::InsertVideo).await.unwrap();
    assert_eq!(opened, ActionOutcome::DialogOpened);
    {
        let surface = session.lock_surface();
        let dialog = surface.dialog().unwrap();
        assert_eq!(dialog.title, "Insert a video");
        assert_eq!(dialog.accept, "video/*");
    }

    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    let outcome = session.submit_video_dialog().await.unwrap();

    assert_eq!(outcome, InsertOutcome::Inserted(media::video_asset("v1", "a.mp4")));
    let html = session.document();
    assert::contains(&html, r#"id="v1""#);
    assert::contains(&html, r#"src="https://x/v1.mp4""#);
    assert::contains(&html, r#"data-filename="a.mp4""#);
    assert::contains(&html, r#"class="help-center-video-content video-wrapper""#);
    assert!(html.starts_with("<p>x</p><div"));
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::UploadVideo {
            file_names: vec!["a.mp4".to_string()],
            content_id: doc_id(),
        }]
    );
    assert_eq!(sink.count(), 1);
    assert_eq!(session.dialog_state(), DialogState::Closed);
    assert!(session.lock_surface().dialog().is_none());
}

#[tokio::test]
async fn test_inserted_video_can_be_deleted() {
    let gateway = RecordingGateway::new().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);

    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    session.submit_video_dialog().await.unwrap();

    session.lock_surface().select_tag("video");
    let outcome = session.delete_video().await.unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));
    assert_eq!(session.document(), "<p>x</p>");
    assert_eq!(sink.count(), 2);
}

#[tokio::test]
async fn test_dialog_blocked_while_uploading() {
    let gateway = RecordingGateway::held().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with("", &gateway, &sink);
    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();

    let submit = session.submit_video_dialog();
    let observe = async {
        gateway.wait_for_calls(1).await;
        assert_eq!(session.dialog_state(), DialogState::Submitting);
        let blocked = session.lock_surface().dialog().unwrap().blocked.clone();
        assert_eq!(blocked.as_deref(), Some("uploading ..."));
        assert!(session.cancel_video_dialog().is_err());
        gateway.release(1);
    };
    let (outcome, ()) = tokio::join!(submit, observe);

    assert!(matches!(outcome.unwrap(), InsertOutcome::Inserted(_)));
    assert!(session.lock_surface().dialog().is_none());
}

#[tokio::test]
async fn test_cancel_dialog_has_no_side_effects() {
    let gateway = RecordingGateway::new().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);

    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    session.cancel_video_dialog().unwrap();

    assert_eq!(gateway.call_count(), 0);
    assert_eq!(session.document(), "<p>x</p>");
    assert_eq!(sink.count(), 0);
    assert_eq!(session.dialog_state(), DialogState::Closed);
    assert!(session.lock_surface().dialog().is_none());
}

#[tokio::test]
async fn test_submit_without_file_closes_dialog() {
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);

    session.open_video_dialog().unwrap();
    let outcome = session.submit_video_dialog().await.unwrap();

    assert_eq!(outcome, InsertOutcome::NoFileSelected);
    assert_eq!(gateway.call_count(), 0);
    assert!(session.lock_surface().dialog().is_none());
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn test_video_upload_failure_closes_dialog() {
    let gateway = RecordingGateway::new().reject_video_upload("transcoder offline");
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);

    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    let err = session.submit_video_dialog().await.unwrap_err();

    assert!(err.is_upload_failure());
    assert_eq!(session.document(), "<p>x</p>");
    assert_eq!(sink.count(), 0);
    assert_eq!(session.dialog_state(), DialogState::Closed);
    let surface = session.lock_surface();
    assert!(surface.dialog().is_none());
    assert_eq!(surface.notices().len(), 1);
}

#[tokio::test]
async fn test_empty_upload_result_inserts_nothing() {
    let gateway = RecordingGateway::new().respond_to_video(Vec::new());
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);

    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    let outcome = session.submit_video_dialog().await.unwrap();

    assert_eq!(outcome, InsertOutcome::NothingUploaded);
    assert_eq!(session.document(), "<p>x</p>");
    assert_eq!(sink.count(), 0);
    assert!(session.lock_surface().dialog().is_none());
}

#[tokio::test]
async fn test_image_upload_hook() {
    let gateway = RecordingGateway::new().respond_to_image(vec![media::image_asset("i1.png")]);
    let sink = RecordingSink::new();
    let session = session_with("", &gateway, &sink);

    let url = session.upload_image(media::png("shot.png")).await.unwrap();

    assert_eq!(url.as_deref(), Some("https://cdn.example.com/i1.png"));
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::UploadImage {
            file_name: "shot.png".to_string(),
            content_id: doc_id(),
        }]
    );
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn test_no_gateway_supplied_completes_without_error() {
    let sink = RecordingSink::new();
    let content = format!("{}{}", docs::with_stored_image("abc.png"), docs::with_video("v1"));
    let session = EditorSession::new(
        MemoryEditor::new(),
        EditorOptions::new()
            .content(content)
            .storage(STORAGE_ORIGIN)
            .on_change(sink.sink()),
    );

    assert_eq!(session.upload_image(media::png("a.png")).await.unwrap(), None);

    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    assert_eq!(
        session.submit_video_dialog().await.unwrap(),
        InsertOutcome::NothingUploaded
    );

    session.lock_surface().select_tag("img");
    assert!(matches!(
        session.delete_image().await.unwrap(),
        DeleteOutcome::Deleted { .. }
    ));
    session.lock_surface().select_tag("video");
    assert!(matches!(
        session.delete_video().await.unwrap(),
        DeleteOutcome::Deleted { .. }
    ));

    assert_eq!(session.document(), "<p>before</p><p>after</p><p>intro</p><p>outro</p>");
    assert_eq!(sink.count(), 2);
}

#[tokio::test]
async fn test_disabled_session_refuses_actions() {
    let gateway = RecordingGateway::new();
    let session = EditorSession::new(
        MemoryEditor::new(),
        EditorOptions::new()
            .content(docs::with_stored_image("abc.png"))
            .storage(STORAGE_ORIGIN)
            .gateway(gateway.clone())
            .disabled(true),
    );
    assert!(session.lock_surface().is_read_only());
    assert!(!session.is_interactive());

    for action in MediaAction::ALL {
        assert_eq!(session.dispatch(action).await.unwrap(), ActionOutcome::Unavailable);
    }
    assert_eq!(gateway.call_count(), 0);

    session.set_disabled(false);
    assert!(session.is_interactive());
    session.lock_surface().select_tag("img");
    let outcome = session
        .dispatch(MediaAction::from_button_name("deleteImage").unwrap())
        .await
        .unwrap();
    assert!(matches!(outcome, ActionOutcome::Delete(DeleteOutcome::Deleted { .. })));
}

#[test]
fn test_content_changed_pushes_each_edit() {
    let sink = RecordingSink::new();
    let session = EditorSession::new(
        MemoryEditor::new(),
        EditorOptions::new().content("<p>a</p>").on_change(sink.sink()),
    );

    {
        let mut surface = session.lock_surface();
        surface.place_caret_at_end();
        assert!(surface.type_text("b"));
    }
    session.content_changed();
    session.lock_surface().type_text("c");
    session.content_changed();

    assert_eq!(
        sink.pushes(),
        vec!["<p>a</p>b".to_string(), "<p>a</p>bc".to_string()]
    );
    assert_eq!(session.sync_count(), 2);
}

#[tokio::test]
async fn test_options_from_settings_use_local_storage() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        storage_origin: Some("cdn.example.com".to_string()),
        content_id: Some("doc-9".to_string()),
        uploads_dir: dir.path().to_path_buf(),
        files_url: "https://cdn.example.com/files".to_string(),
        ..Settings::default()
    };
    let options = EditorOptions::from_settings(&settings).unwrap();
    let session = EditorSession::new(MemoryEditor::new(), options);

    let url = session
        .upload_image(media::png("a.png"))
        .await
        .unwrap()
        .unwrap();
    assert!(url.starts_with("https://cdn.example.com/files/doc-9/images/"));

    session
        .lock_surface()
        .load(&format!(r#"<img src="{url}">"#));
    session.lock_surface().select_tag("img");
    let outcome = session.delete_image().await.unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));

    let images = dir.path().join("doc-9").join("images");
    assert_eq!(std::fs::read_dir(images).unwrap().count(), 0);
}

#[tokio::test]
async fn test_video_submit_refused_while_delete_in_flight() {
    let gateway = RecordingGateway::held().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with(&docs::with_stored_image("abc.png"), &gateway, &sink);
    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    session.lock_surface().select_tag("img");

    let delete = session.delete_image();
    let submit_during_delete = async {
        gateway.wait_for_calls(1).await;
        let outcome = session.submit_video_dialog().await.unwrap();
        gateway.release(1);
        outcome
    };
    let (deleted, refused) = tokio::join!(delete, submit_during_delete);

    assert!(matches!(deleted.unwrap(), DeleteOutcome::Deleted { .. }));
    assert_eq!(refused, InsertOutcome::Unavailable);
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(session.document(), "<p>before</p><p>after</p>");
    assert_eq!(session.dialog_state(), DialogState::Open);
    assert!(session.lock_surface().dialog().is_some());

    gateway.release(1);
    let outcome = session.submit_video_dialog().await.unwrap();
    assert!(matches!(outcome, InsertOutcome::Inserted(ref asset) if asset.id == "v1"));
    assert::contains(&session.document(), r#"data-container-id="v1""#);
}

#[tokio::test]
async fn test_video_submit_refused_while_disabled() {
    let gateway = RecordingGateway::new().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);
    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    session.set_disabled(true);

    let outcome = session.submit_video_dialog().await.unwrap();

    assert_eq!(outcome, InsertOutcome::Unavailable);
    assert_eq!(gateway.call_count(), 0);
    assert_eq!(session.document(), "<p>x</p>");
    assert_eq!(session.dialog_state(), DialogState::Open);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn test_disabled_during_upload_skips_insert() {
    let gateway = RecordingGateway::held().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with("<p>x</p>", &gateway, &sink);
    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();

    let submit = session.submit_video_dialog();
    let disable = async {
        gateway.wait_for_calls(1).await;
        session.set_disabled(true);
        gateway.release(1);
    };
    let (outcome, ()) = tokio::join!(submit, disable);

    assert_eq!(outcome.unwrap(), InsertOutcome::Unavailable);
    assert_eq!(session.document(), "<p>x</p>");
    assert_eq!(sink.count(), 0);
    assert_eq!(session.dialog_state(), DialogState::Closed);
    assert!(session.lock_surface().dialog().is_none());
}

#[tokio::test]
async fn test_delete_during_upload_finishes_before_insert() {
    let gateway = RecordingGateway::held().respond_to_video(vec![media::video_asset("v1", "a.mp4")]);
    let sink = RecordingSink::new();
    let session = session_with(&docs::with_stored_image("abc.png"), &gateway, &sink);
    session.open_video_dialog().unwrap();
    session.select_video_files(vec![media::mp4("a.mp4")]).unwrap();
    session.lock_surface().select_tag("img");

    let submit = session.submit_video_dialog();
    let delete = async {
        gateway.wait_for_calls(1).await;
        session.delete_image().await
    };
    let driver = async {
        gateway.wait_for_calls(2).await;
        // Upload returns first; the insert must wait for the delete.
        gateway.release(1);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let during = session.document();
        gateway.release(1);
        during
    };
    let (inserted, deleted, during) = tokio::join!(submit, delete, driver);

    assert!(matches!(inserted.unwrap(), InsertOutcome::Inserted(_)));
    assert!(matches!(deleted.unwrap(), DeleteOutcome::Deleted { .. }));
    assert::not_contains(&during, "video-wrapper");
    let html = session.document();
    assert::not_contains(&html, "<img");
    assert::contains(&html, r#"data-container-id="v1""#);
    assert_eq!(sink.count(), 2);
    assert!(!session.lock_surface().is_read_only());
}

#[tokio::test]
async fn test_deeply_nested_content_loads() {
    const DEPTH: usize = 100_000;
    let nested = format!("<p>{}deep{}</p>", "<span>".repeat(DEPTH), "</span>".repeat(DEPTH));
    let gateway = RecordingGateway::new();
    let sink = RecordingSink::new();
    let content = format!("{nested}{}", docs::with_stored_image("abc.png"));
    let session = session_with(&content, &gateway, &sink);

    let html = session.document();
    assert::contains(&html, "deep");
    // The paragraph takes one level of the nesting budget.
    assert_eq!(html.matches("<span>").count(), MAX_NESTING_DEPTH - 1);

    session.lock_surface().select_tag("img");
    let outcome = session.delete_image().await.unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));
    assert::not_contains(&session.document(), "<img");
}
