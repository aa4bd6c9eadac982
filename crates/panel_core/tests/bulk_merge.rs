use panel_core::{
    contains_url, merge_sorted, strip_add_to_bulk_flag, title_sort_key, update, ClientState,
    Envelope, InstanceId, Msg,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn titles_sort_without_leading_articles() {
    let merged = merge_sorted(
        "// Another Movie\nhttps://mediux.pro/x\n",
        "The Great Movie",
        "https://mediux.pro/y",
    );

    assert_eq!(
        merged,
        "// Another Movie\nhttps://mediux.pro/x\n\n// The Great Movie\nhttps://mediux.pro/y\n\n"
    );
    assert_eq!(title_sort_key("The Great Movie"), "great movie");
    assert_eq!(title_sort_key("The"), "the");
}

#[test]
fn standalone_links_land_in_reserved_trailing_groups() {
    let text = "https://theposterdb.com/set/9\n\n// Zulu\nhttps://mediux.pro/sets/3\n\nhttps://mediux.pro/sets/4\n";
    let merged = merge_sorted(text, "An Alpha", "https://mediux.pro/sets/5");

    assert_eq!(
        merged,
        concat!(
            "// An Alpha\nhttps://mediux.pro/sets/5\n\n",
            "// Zulu\nhttps://mediux.pro/sets/3\n\n",
            "// MediUX URLs\nhttps://mediux.pro/sets/4\n\n",
            "// The Poster DB URLs\nhttps://theposterdb.com/set/9\n\n",
        )
    );
}

#[test]
fn repeated_titles_share_one_group() {
    let merged = merge_sorted("// Alien\nhttps://mediux.pro/a\n", "Alien", "https://mediux.pro/b");
    assert_eq!(merged, "// Alien\nhttps://mediux.pro/a\nhttps://mediux.pro/b\n\n");
}

#[test]
fn duplicates_match_whole_lines_with_optional_flags() {
    let text = "// Alien\nhttps://mediux.pro/sets/1 --filters poster\nhttps://mediux.pro/sets/10\n";

    assert!(contains_url(text, "https://mediux.pro/sets/1"));
    assert!(contains_url(text, "https://mediux.pro/sets/10 --add-to-bulk"));
    assert!(!contains_url(text, "https://mediux.pro/sets/"));
    assert!(!contains_url(text, "https://mediux.pro/sets/100"));
    assert_eq!(
        strip_add_to_bulk_flag("https://mediux.pro/sets/1 --add-to-bulk"),
        "https://mediux.pro/sets/1"
    );
}

fn loaded(auto_manage: bool, text: &str) -> ClientState {
    let id = InstanceId::from_persisted("client-a").expect("id");
    let replies = [
        (
            "load_config",
            json!({"config": {"bulk_txt": "bulk.txt", "auto_manage_bulk_files": auto_manage}}),
        ),
        ("load_bulk_filelist", json!({"bulk_files": ["bulk.txt"]})),
        (
            "load_bulk_import",
            json!({"loaded": true, "filename": "bulk.txt", "bulk_import_text": text}),
        ),
    ];
    let (mut state, _) = update(ClientState::new(id.clone()), Msg::SessionStarted);
    for (event, payload) in replies {
        state = update(state, server(&id, event, payload)).0;
    }
    state
}

fn server(id: &InstanceId, event: &str, payload: serde_json::Value) -> Msg {
    Msg::ServerMessage(Envelope::new(event, id, payload))
}

fn push(state: ClientState, url: &str, title: &str) -> ClientState {
    let id = state.instance_id().clone();
    update(state, server(&id, "add_to_bulk_list", json!({"url": url, "title": title}))).0
}

#[test]
fn pushed_links_append_when_auto_manage_is_off() {
    let state = push(loaded(false, "first"), "https://mediux.pro/sets/2 --add-to-bulk", "Heat");

    assert_eq!(state.bulk().edited_text(), "first\n// Heat\nhttps://mediux.pro/sets/2\n");
    assert!(state.bulk().is_dirty());
}

#[test]
fn pushed_links_are_sorted_in_when_auto_manage_is_on() {
    let state = loaded(true, "// Zodiac\nhttps://mediux.pro/sets/9\n");
    let state = push(state, "https://mediux.pro/sets/2", "The Birds");

    assert_eq!(
        state.bulk().edited_text(),
        "// The Birds\nhttps://mediux.pro/sets/2\n\n// Zodiac\nhttps://mediux.pro/sets/9\n\n"
    );
}

#[test]
fn pushed_duplicates_are_never_inserted_twice() {
    let state = loaded(true, "// Heat\nhttps://mediux.pro/sets/2 --filters poster\n");
    let state = push(state, "https://mediux.pro/sets/2 --add-to-bulk", "Heat");

    assert_eq!(
        state.bulk().edited_text(),
        "// Heat\nhttps://mediux.pro/sets/2 --filters poster\n"
    );
    assert!(!state.bulk().is_dirty());
}
