use panel_core::{update, ClientState, Effect, InstanceId, Msg, UploadPlan, UploadRequest, UploadSession, DEFAULT_CHUNK_SIZE};
use pretty_assertions::assert_eq;

#[test]
fn two_hundred_thousand_bytes_make_four_chunks() {
    let plan = UploadPlan::new(200_000, DEFAULT_CHUNK_SIZE);
    let chunks: Vec<_> = plan.chunks().collect();

    assert_eq!(plan.total_chunks(), 4);
    assert_eq!(
        chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(
        chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
        vec![65536, 65536, 65536, 3392]
    );
}

#[test]
fn empty_payload_has_no_chunks() {
    let plan = UploadPlan::new(0, DEFAULT_CHUNK_SIZE);
    assert_eq!(plan.total_chunks(), 0);
    assert_eq!(plan.chunks().count(), 0);
    assert_eq!(UploadSession::new("empty.zip", 0, DEFAULT_CHUNK_SIZE).percent(), 100);
}

#[test]
fn session_only_advances_in_order() {
    let mut session = UploadSession::new("set.zip", 150, 100);
    let first = session.next_chunk().expect("first chunk");
    let second = UploadPlan::new(150, 100).chunks().nth(1).expect("second chunk");

    session.advance(&second);
    assert_eq!(session.offset(), 0);

    session.advance(&first);
    assert_eq!(session.offset(), 100);
    assert_eq!(session.percent(), 66);

    let next = session.next_chunk().expect("second chunk");
    assert_eq!(next, second);
    session.advance(&next);
    assert!(session.is_complete());
    assert_eq!(session.next_chunk(), None);
}

#[test]
fn only_zip_archives_are_uploaded() {
    let state = ClientState::new(InstanceId::generate());
    let request = UploadRequest {
        file_name: "poster.png".to_string(),
        bytes: vec![1, 2, 3],
        ..UploadRequest::default()
    };
    let (state, effects) = update(state, Msg::ArtworkUploadRequested(request));
    assert!(effects.is_empty());
    assert_eq!(state.view().validation[0].message, "Please drop a valid ZIP file.");

    let request = UploadRequest {
        file_name: "Set.ZIP".to_string(),
        bytes: vec![1, 2, 3],
        ..UploadRequest::default()
    };
    let (state, effects) = update(state, Msg::ArtworkUploadRequested(request.clone()));
    assert_eq!(effects, vec![Effect::UploadArtwork(request)]);
    assert!(state.view().validation.is_empty());
    assert_eq!(state.view().progress.map(|p| p.percent), Some(0));
}

#[test]
fn finished_progress_bar_hides_after_a_moment() {
    let state = ClientState::new(InstanceId::generate());
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            file_name: "set.zip".to_string(),
        },
    );
    let progress = state.view().progress.expect("visible");
    assert_eq!(progress.percent, 100);
    assert_eq!(progress.label, "Upload complete!");

    let (state, _) = update(state, Msg::Tick(std::time::Duration::from_secs(1)));
    assert!(state.view().progress.is_some());
    let (state, _) = update(state, Msg::Tick(std::time::Duration::from_secs(1)));
    assert!(state.view().progress.is_none());
}
