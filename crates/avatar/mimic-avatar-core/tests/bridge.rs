use std::thread;

use mimic_avatar_core::{BridgeRegistry, SharedVisemeDriver, SpeechSink, VisemeDriver};

fn pipeline_push(sink: &dyn SpeechSink, text: &str, audio: f32) {
    sink.push_text(text);
    sink.push_audio_duration(audio);
}

/// it should let a streaming thread feed the driver the frame loop ticks
#[test]
fn pushes_from_another_thread_reach_the_frame_loop() {
    let shared = SharedVisemeDriver::new(VisemeDriver::default());
    let producer = shared.clone();
    thread::spawn(move || pipeline_push(&producer, "hello world", 1.5))
        .join()
        .unwrap();

    let state = shared.update(1.0 / 60.0);
    assert!(state.is_active);
    assert!(state.current_viseme.is_some());
    assert_eq!(shared.lock().total_audio_duration(), 1.5);
}

/// it should expose only the most recently registered driver
#[test]
fn later_registration_replaces_earlier() {
    let mut registry = BridgeRegistry::new();
    assert!(registry.current().is_none());

    let first = SharedVisemeDriver::default();
    let second = SharedVisemeDriver::default();
    assert!(registry.register(first.clone()).is_none());
    let replaced = registry.register(second.clone()).expect("first handle returned");
    assert!(replaced.same_driver(&first));

    let current = registry.current().unwrap();
    assert!(current.same_driver(&second));
    assert!(!current.same_driver(&first));

    current.push_text("ok");
    assert!(second.state().is_active);
    assert!(!first.state().is_active);

    registry.clear();
    assert!(!registry.is_registered());
}

/// it should keep working after a panic while the lock was held
#[test]
fn poisoned_lock_is_recovered() {
    let shared = SharedVisemeDriver::default();
    let victim = shared.clone();
    let result = thread::spawn(move || {
        let _guard = victim.lock();
        panic!("pipeline crashed mid-push");
    })
    .join();
    assert!(result.is_err());

    shared.push_text("still here");
    assert!(shared.state().is_active);
    shared.reset();
    assert!(!shared.state().is_active);
}
