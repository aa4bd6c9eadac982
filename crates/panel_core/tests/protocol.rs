use panel_core::{Command, Envelope, InstanceId, ServerEvent};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn id(raw: &str) -> InstanceId {
    InstanceId::from_persisted(raw).expect("test id")
}

#[test]
fn inbound_frame_splits_addressing_from_payload() {
    let envelope = Envelope::from_wire(
        r#"{"event":"load_bulk_filelist","data":{"instance_id":"abc","bulk_files":["a.txt"]}}"#,
    )
    .expect("valid frame");

    assert_eq!(envelope.event, "load_bulk_filelist");
    assert_eq!(envelope.instance_id.as_deref(), Some("abc"));
    assert!(!envelope.is_broadcast());
    assert_eq!(envelope.payload, json!({"bulk_files": ["a.txt"]}));
}

#[test]
fn messages_for_other_instances_are_not_addressed_to_us() {
    let me = id("client-a");
    let other = Envelope::new("status_update", &id("client-b"), json!({"message": "hi"}));
    let mine = Envelope::new("status_update", &me, json!({"message": "hi"}));

    assert!(!other.is_addressed_to(&me, true));
    assert!(mine.is_addressed_to(&me, false));
}

#[test]
fn broadcast_needs_an_opted_in_handler() {
    let me = id("client-a");
    let marker = Envelope::broadcast("backend_restarting", json!({}));
    let flagged = Envelope::from_wire(
        r#"{"event":"status_update","data":{"broadcast":true,"message":"all"}}"#,
    )
    .expect("valid frame");

    assert!(marker.is_addressed_to(&me, true));
    assert!(!marker.is_addressed_to(&me, false));
    assert!(flagged.is_broadcast());
    assert!(flagged.is_addressed_to(&me, ServerEvent::allows_broadcast("status_update")));
    assert!(!ServerEvent::allows_broadcast("load_bulk_import"));
}

#[test]
fn commands_serialize_with_instance_id_inside_data() {
    let me = id("client-a");
    let envelope = Command::UploadArtworkChunk {
        file_name: "set.zip".to_string(),
        chunk_data: "AAEC".to_string(),
        chunk_index: 2,
        total_chunks: 4,
    }
    .into_envelope(&me)
    .expect("encodes");

    let wire: Value = serde_json::from_str(&envelope.to_wire().expect("serializes")).expect("json");
    assert_eq!(
        wire,
        json!({
            "event": "upload_artwork_chunk",
            "data": {
                "instance_id": "client-a",
                "fileName": "set.zip",
                "chunkData": "AAEC",
                "chunkIndex": 2,
                "totalChunks": 4,
            }
        })
    );
}

#[test]
fn unit_commands_carry_only_the_instance_id() {
    let envelope = Command::LoadConfig.into_envelope(&id("client-a")).expect("encodes");
    assert_eq!(envelope.payload, json!({}));
    assert_eq!(envelope.to_wire().expect("serializes"), r#"{"event":"load_config","data":{"instance_id":"client-a"}}"#);
}

#[test]
fn element_disable_accepts_one_id_or_many() {
    let me = id("client-a");
    let single = Envelope::new("element_disable", &me, json!({"element": "scrape_btn", "mode": false}));
    let many = Envelope::new("element_disable", &me, json!({"element": ["a", "b"]}));

    assert_eq!(
        ServerEvent::decode(&single).expect("decodes"),
        ServerEvent::ElementDisable {
            elements: vec!["scrape_btn".to_string()],
            disabled: false,
        }
    );
    assert_eq!(
        ServerEvent::decode(&many).expect("decodes"),
        ServerEvent::ElementDisable {
            elements: vec!["a".to_string(), "b".to_string()],
            disabled: true,
        }
    );
}

#[test]
fn unknown_events_decode_without_error() {
    let envelope = Envelope::new("something_new", &id("client-a"), json!({"x": 1}));
    assert_eq!(
        ServerEvent::decode(&envelope).expect("decodes"),
        ServerEvent::Unknown {
            event: "something_new".to_string()
        }
    );
}

#[test]
fn config_round_trips_unknown_keys() {
    let envelope = Envelope::new(
        "load_config",
        &id("client-a"),
        json!({"config": {"base_url": "http://plex:32400", "bulk_txt": "bulk.txt", "future_flag": 3}}),
    );
    let ServerEvent::ConfigLoaded { config: Some(config) } =
        ServerEvent::decode(&envelope).expect("decodes")
    else {
        panic!("expected config");
    };

    assert_eq!(config.base_url, "http://plex:32400");
    assert_eq!(config.bulk_txt, "bulk.txt");
    assert_eq!(config.extra.get("future_flag"), Some(&json!(3)));
    let back = serde_json::to_value(&config).expect("serializes");
    assert_eq!(back["future_flag"], json!(3));
}
