use extractor_core::{update, AppState, Msg};

#[test]
fn engine_events_without_a_job_are_ignored() {
    let state = AppState::new();
    let (next, effects) = update(
        state.clone(),
        Msg::ContentAppended {
            job_id: 1,
            text: "stray".into(),
        },
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
