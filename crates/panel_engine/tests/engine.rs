use std::sync::{Arc, Once};
use std::time::Duration;

use panel_core::{Command, Envelope, FailureReason, InstanceId, UploadRequest};
use panel_engine::{ChannelBackend, ChannelConnector, EngineEvent, EngineHandle, EngineSettings};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(panel_logging::initialize_for_tests);
}

fn me() -> InstanceId {
    InstanceId::from_persisted("client-a").unwrap()
}

fn settings() -> EngineSettings {
    EngineSettings {
        reply_timeout: Duration::from_millis(200),
        chunk_delay: Duration::ZERO,
        ..EngineSettings::default()
    }
}

async fn start(
    settings: EngineSettings,
) -> (EngineHandle, ChannelConnector, UnboundedReceiver<ChannelBackend>, ChannelBackend) {
    init_logging();
    let (connector, mut backends) = ChannelConnector::new();
    let engine = EngineHandle::start(settings, me(), Arc::new(connector.clone())).unwrap();
    let backend = backends.recv().await.unwrap();
    (engine, connector, backends, backend)
}

async fn next_event(engine: &EngineHandle) -> EngineEvent {
    for _ in 0..300 {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no engine event");
}

#[tokio::test]
async fn request_reply_round_trip() {
    let (engine, _connector, _backends, mut backend) = start(settings()).await;

    engine.request(Command::LoadBulkFilelist);
    let sent = backend.next_sent().await.unwrap();
    assert_eq!(sent.event, "load_bulk_filelist");
    assert_eq!(sent.instance_id.as_deref(), Some("client-a"));

    let reply = Envelope::new("load_bulk_filelist", &me(), json!({"bulk_files": ["a.txt"]}));
    backend.reply(reply.clone()).unwrap();

    assert_eq!(next_event(&engine).await, EngineEvent::Message(reply));
}

#[tokio::test]
async fn concurrent_request_for_the_same_event_is_busy() {
    let (engine, _connector, _backends, _backend) = start(settings()).await;

    engine.request(Command::LoadConfig);
    engine.request(Command::LoadConfig);

    assert_eq!(
        next_event(&engine).await,
        EngineEvent::RequestFailed {
            event: "load_config".to_string(),
            reason: FailureReason::Busy,
        }
    );
}

#[tokio::test]
async fn missing_reply_times_out_and_frees_the_slot() {
    let (engine, _connector, _backends, mut backend) = start(settings()).await;

    engine.request(Command::CreateBulkFile);
    backend.next_sent().await.unwrap();
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::RequestFailed {
            event: "create_bulk_file".to_string(),
            reason: FailureReason::TimedOut,
        }
    );

    engine.request(Command::CreateBulkFile);
    assert_eq!(backend.next_sent().await.unwrap().event, "create_bulk_file");
}

#[tokio::test]
async fn pushes_and_foreign_replies_pass_through_unclaimed() {
    let (engine, _connector, _backends, mut backend) = start(settings()).await;
    engine.request(Command::LoadBulkImport {
        filename: "a.txt".to_string(),
    });
    backend.next_sent().await.unwrap();

    let other = InstanceId::from_persisted("client-b").unwrap();
    let foreign = Envelope::new("load_bulk_import", &other, json!({"loaded": true}));
    backend.reply(foreign.clone()).unwrap();
    assert_eq!(next_event(&engine).await, EngineEvent::Message(foreign));

    let mine = Envelope::new("load_bulk_import", &me(), json!({"loaded": true}));
    backend.reply(mine.clone()).unwrap();
    assert_eq!(next_event(&engine).await, EngineEvent::Message(mine));
}

#[tokio::test]
async fn upload_reports_progress_and_completion() {
    let (engine, _connector, _backends, mut backend) = start(settings()).await;
    engine.upload(UploadRequest {
        file_name: "set.zip".to_string(),
        bytes: vec![7; 70_000],
        ..UploadRequest::default()
    });

    let mut events = Vec::new();
    while let Some(frame) = backend.next_sent().await {
        let done = frame.event == "upload_complete";
        events.push(frame.event);
        if done {
            break;
        }
    }
    assert_eq!(
        events,
        vec![
            "display_message",
            "upload_artwork_chunk",
            "upload_artwork_chunk",
            "display_message",
            "upload_complete",
        ]
    );

    let mut finished = false;
    for _ in 0..3 {
        if let EngineEvent::UploadFinished { file_name } = next_event(&engine).await {
            assert_eq!(file_name, "set.zip");
            finished = true;
            break;
        }
    }
    assert!(finished);
}

#[tokio::test]
async fn dropped_backend_is_reported_and_reload_reconnects() {
    let (engine, connector, mut backends, backend) = start(settings()).await;

    drop(backend);
    assert!(matches!(
        next_event(&engine).await,
        EngineEvent::Disconnected { .. }
    ));

    engine.request(Command::LoadConfig);
    assert!(matches!(
        next_event(&engine).await,
        EngineEvent::RequestFailed { reason: FailureReason::Transport(_), .. }
    ));

    connector.set_online(false);
    engine.reload(Duration::from_millis(10));
    assert!(matches!(
        next_event(&engine).await,
        EngineEvent::ReloadFailed { .. }
    ));

    connector.set_online(true);
    engine.reload(Duration::from_millis(10));
    assert_eq!(next_event(&engine).await, EngineEvent::ReloadReady);

    let mut backend = backends.recv().await.unwrap();
    engine.request(Command::LoadConfig);
    assert_eq!(backend.next_sent().await.unwrap().event, "load_config");
}

#[tokio::test]
async fn delayed_request_waits_before_sending() {
    let (engine, _connector, _backends, mut backend) = start(settings()).await;

    engine.notify(Command::SetPassword {
        username: "admin".to_string(),
        password: "hunter2".to_string(),
    });
    engine.request_after(Command::SaveConfig { config: Default::default() }, Duration::from_millis(50));

    assert_eq!(backend.next_sent().await.unwrap().event, "set_password");
    let started = tokio::time::Instant::now();
    assert_eq!(backend.next_sent().await.unwrap().event, "save_config");
    assert!(started.elapsed() >= Duration::from_millis(30));
}
