mod common;

use common::{detector, opener, video_file, FailingModel, FakeBackend};
use solanum_core::{Error, SourceType};
use solanum_eye::{Detector, SessionState, SourceDescriptor, Step, StreamingSession};
use solanum_storage::HistoryStore;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

fn session(backend: FakeBackend, history: HistoryStore) -> (StreamingSession, Arc<common::Probe>) {
    let (opener, probe) = opener(backend);
    (StreamingSession::new(opener, detector(), Arc::new(history), 0), probe)
}

#[test]
fn test_video_runs_to_exhaustion() {
    let dir = tempfile::tempdir().unwrap();
    let path = video_file(&dir, "field.mp4");
    let (session, probe) = session(FakeBackend::new(Some(10)), HistoryStore::in_memory());

    session.start(&SourceDescriptor::video(&path), 0.5).unwrap();
    assert!(session.is_running());

    let mut indices = Vec::new();
    let state = session.run(|step| {
        if let Step::Frame(inference) = step {
            indices.push(inference.frame_index);
        }
        ControlFlow::Continue(())
    });

    assert_eq!(state, SessionState::Exhausted);
    assert_eq!(indices, (0..10).collect::<Vec<u64>>());
    assert_eq!(session.stats().frames_processed, 10);
    assert_eq!(probe.live(), 0);
    assert_eq!(probe.released.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn test_bad_frame_is_skipped_and_next_frame_processed() {
    let (session, _probe) = session(FakeBackend::new(None).malformed_at(3), HistoryStore::in_memory());
    session.start(&SourceDescriptor::webcam(0), 0.4).unwrap();

    let steps: Vec<Step> = (0..6).map(|_| session.next()).collect();
    assert!(matches!(steps[2], Step::Frame(_)));
    match &steps[3] {
        Step::Skipped { frame_index, error } => {
            assert_eq!(*frame_index, 3);
            assert!(matches!(error, Error::Inference(_)));
        }
        other => panic!("expected skipped frame, got {:?}", other),
    }
    match &steps[4] {
        Step::Frame(inference) => assert_eq!(inference.frame_index, 4),
        other => panic!("expected frame 4, got {:?}", other),
    }
    assert!(session.is_running());
    assert_eq!(session.stats().frames_skipped, 1);
    assert_eq!(session.stats().frames_processed, 5);
    assert_eq!(session.stop(), SessionState::Stopped);
}

#[test]
fn test_model_failure_skips_only_that_frame() {
    let (opener, _probe) = opener(FakeBackend::new(None));
    let detector = Arc::new(Detector::new(Arc::new(FailingModel::on_call(2))));
    let session = StreamingSession::new(opener, detector, Arc::new(HistoryStore::in_memory()), 0);
    session.start(&SourceDescriptor::webcam(0), 0.4).unwrap();

    let steps: Vec<Step> = (0..4).map(|_| session.next()).collect();
    assert!(matches!(steps[1], Step::Frame(_)));
    match &steps[2] {
        Step::Skipped { frame_index, error } => {
            assert_eq!(*frame_index, 2);
            assert!(matches!(error, Error::Inference(_)));
        }
        other => panic!("expected skipped frame, got {:?}", other),
    }
    match &steps[3] {
        Step::Frame(inference) => {
            assert_eq!(inference.frame_index, 3);
            assert_eq!(inference.detections.len(), 1);
        }
        other => panic!("expected frame 3, got {:?}", other),
    }
    assert!(session.is_running());
    assert_eq!(session.stats().frames_skipped, 1);
    assert_eq!(session.stop(), SessionState::Stopped);
}

#[test]
fn test_stop_releases_handle_and_is_idempotent() {
    let (session, probe) = session(FakeBackend::new(None), HistoryStore::in_memory());
    session.start(&SourceDescriptor::webcam(1), 0.4).unwrap();
    assert!(matches!(session.next(), Step::Frame(_)));
    assert_eq!(probe.live(), 1);

    assert_eq!(session.stop(), SessionState::Stopped);
    assert_eq!(probe.live(), 0);
    assert_eq!(session.stop(), SessionState::Stopped);
    assert!(matches!(session.next(), Step::Finished(SessionState::Stopped)));
}

#[test]
fn test_stop_from_another_thread() {
    let (session, probe) = session(FakeBackend::new(None), HistoryStore::in_memory());
    let session = Arc::new(session);
    session.start(&SourceDescriptor::webcam(0), 0.4).unwrap();

    let stopper = {
        let session = session.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            session.stop()
        })
    };

    let state = session.run(|_| ControlFlow::Continue(()));
    assert_eq!(state, SessionState::Stopped);
    assert_eq!(stopper.join().unwrap(), SessionState::Stopped);
    assert_eq!(probe.live(), 0);
}

#[test]
fn test_break_from_callback_stops() {
    let (session, probe) = session(FakeBackend::new(None), HistoryStore::in_memory());
    session
        .start(&SourceDescriptor::youtube("https://youtu.be/dQw4w9WgXcQ"), 0.4)
        .unwrap();

    let mut seen = 0;
    let state = session.run(|step| {
        if matches!(step, Step::Frame(_)) {
            seen += 1;
        }
        if seen == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(state, SessionState::Stopped);
    assert_eq!(seen, 3);
    assert_eq!(probe.live(), 0);
}

#[test]
fn test_second_webcam_open_fails_while_live() {
    let backend = FakeBackend::new(None);
    let (opener, probe) = opener(backend);
    let first = StreamingSession::new(opener.clone(), detector(), Arc::new(HistoryStore::in_memory()), 0);
    let second = StreamingSession::new(opener, detector(), Arc::new(HistoryStore::in_memory()), 0);

    first.start(&SourceDescriptor::webcam(0), 0.4).unwrap();
    let result = second.start(&SourceDescriptor::webcam(0), 0.4);
    assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    assert_eq!(second.state(), SessionState::Failed);
    assert_eq!(probe.live(), 1);

    first.stop();
    second.start(&SourceDescriptor::webcam(0), 0.4).unwrap();
    assert!(second.is_running());
}

#[test]
fn test_start_while_running_is_rejected() {
    let (session, _probe) = session(FakeBackend::new(None), HistoryStore::in_memory());
    session.start(&SourceDescriptor::webcam(0), 0.4).unwrap();
    assert!(matches!(
        session.start(&SourceDescriptor::webcam(1), 0.4),
        Err(Error::InvalidState(_))
    ));
    session.stop();
    // Restart after a terminal state is allowed.
    session.start(&SourceDescriptor::webcam(1), 0.4).unwrap();
}

#[test]
fn test_resolver_failure_fails_session() {
    let (session, probe) = session(FakeBackend::new(None), HistoryStore::in_memory());
    let result = session.start(&SourceDescriptor::youtube("https://vimeo.com/1"), 0.4);
    assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(probe.opened.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn test_capture_current_records_latest_frame() {
    let history = HistoryStore::in_memory();
    let (session, _probe) = session(FakeBackend::new(None), history.clone());
    session.start(&SourceDescriptor::webcam(0), 0.4).unwrap();

    assert!(matches!(session.capture_current(), Err(Error::InvalidState(_))));
    session.next();
    session.next();
    let id = session.capture_current().unwrap();

    let record = history.get(id).unwrap().unwrap();
    assert_eq!(record.source_type, SourceType::Webcam);
    assert_eq!(record.source_path, "");
    let image = image::load_from_memory(&record.detected_image).unwrap();
    assert_eq!((image.width(), image.height()), (32, 18));
    assert_eq!(session.stats().captures, 1);

    session.stop();
    assert!(matches!(session.capture_current(), Err(Error::InvalidState(_))));
}

#[test]
fn test_capture_with_disabled_history_keeps_streaming() {
    let (session, _probe) = session(FakeBackend::new(None), HistoryStore::disabled("no disk"));
    session.start(&SourceDescriptor::webcam(0), 0.4).unwrap();
    session.next();
    assert!(matches!(session.capture_current(), Err(Error::StoreUnavailable(_))));
    assert!(matches!(session.next(), Step::Frame(_)));
}

#[test]
fn test_drop_releases_source() {
    let (session, probe) = session(FakeBackend::new(None), HistoryStore::in_memory());
    session.start(&SourceDescriptor::webcam(0), 0.4).unwrap();
    session.next();
    drop(session);
    assert_eq!(probe.live(), 0);
}
