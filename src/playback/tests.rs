use super::*;
use crate::error::ChordlabError;
use std::cell::RefCell;
use std::rc::Rc;

/// Notifications seen by a listener, stamped with the virtual time.
type Log = Rc<RefCell<Vec<(f64, PlaybackNotification)>>>;

fn event(kind: EventType, note: u8, timestamp_ms: f64) -> RecordingEvent {
    RecordingEvent {
        kind,
        note,
        velocity: kind.default_velocity(),
        timestamp_ms,
        channel: 0,
    }
}

fn recording(events: Vec<RecordingEvent>) -> Recording {
    let duration_ms = events.iter().map(|e| e.timestamp_ms).fold(0.0, f64::max);
    Recording {
        version: RECORDING_VERSION.to_string(),
        id: uuid::Uuid::new_v4(),
        name: "test".to_string(),
        created_at: 1_700_000_000_000,
        duration_ms,
        metadata: None,
        events,
        extra: Default::default(),
    }
}

/// C E G, one note every 100 ms, released at 400 ms.
fn arpeggio() -> Recording {
    recording(vec![
        event(EventType::NoteOn, 60, 0.0),
        event(EventType::NoteOn, 64, 100.0),
        event(EventType::NoteOn, 67, 200.0),
        event(EventType::NoteOff, 60, 400.0),
    ])
}

fn player_with(rec: Recording) -> (ManualClock, Player<ManualClock>, Log) {
    let clock = ManualClock::new(1_000.0);
    let mut player = Player::new(clock.clone());
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    for channel in [Channel::Event, Channel::Progress, Channel::Stop, Channel::Complete] {
        let sink = Rc::clone(&log);
        let time = clock.clone();
        player.on(channel, move |n| sink.borrow_mut().push((time.now_ms(), n.clone())));
    }
    player.load_recording(rec).unwrap();
    (clock, player, log)
}

fn notes(log: &Log) -> Vec<u8> {
    log.borrow()
        .iter()
        .filter_map(|(_, n)| match n {
            PlaybackNotification::Event(e) => Some(e.note),
            _ => None,
        })
        .collect()
}

fn count(log: &Log, channel: Channel) -> usize {
    log.borrow().iter().filter(|(_, n)| n.channel() == channel).count()
}

#[test]
fn test_play_to_completion() {
    let rec = arpeggio();
    let total = rec.events.len();
    let (clock, mut player, log) = player_with(rec);

    player.play().unwrap();
    assert_eq!(player.state(), PlaybackState::Playing);
    player.run(|ms| clock.advance(ms));

    assert_eq!(notes(&log), vec![60, 64, 67, 60]);
    assert_eq!(count(&log, Channel::Event), total);
    assert_eq!(count(&log, Channel::Progress), total);
    assert_eq!(count(&log, Channel::Complete), 1);
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(player.current_index(), 0);
    assert_eq!(player.current_time_ms(), 0.0);
    assert_eq!(clock.now_ms(), 1_400.0);
}

#[test]
fn test_event_then_progress_ordering() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.play().unwrap();
    player.run(|ms| clock.advance(ms));

    let log = log.borrow();
    let channels: Vec<Channel> = log.iter().map(|(_, n)| n.channel()).collect();
    assert_eq!(&channels[..2], &[Channel::Event, Channel::Progress]);
    assert_eq!(channels.last(), Some(&Channel::Complete));

    let progress: Vec<f64> = log
        .iter()
        .filter_map(|(_, n)| match n {
            PlaybackNotification::Progress(p) => Some(p.progress),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![0.0, 25.0, 50.0, 100.0]);

    match &log.last().unwrap().1 {
        PlaybackNotification::Complete(c) => {
            assert_eq!(c.duration_ms, 400.0);
            assert_eq!(c.total_events, 4);
        }
        other => panic!("expected complete, got {:?}", other),
    }
}

#[test]
fn test_rate_two_halves_wall_time() {
    let (clock, mut player, log) = player_with(recording(vec![
        event(EventType::NoteOn, 60, 0.0),
        event(EventType::NoteOff, 60, 500.0),
    ]));
    player.set_playback_rate(2.0).unwrap();
    let started = clock.now_ms();
    player.play().unwrap();
    player.run(|ms| clock.advance(ms));

    let log = log.borrow();
    let (completed_at, _) = log
        .iter()
        .find(|(_, n)| n.channel() == Channel::Complete)
        .unwrap();
    assert_eq!(completed_at - started, 250.0);
}

#[test]
fn test_poll_fires_only_due_events() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.play().unwrap();
    assert_eq!(player.poll(), 1);
    clock.advance(150.0);
    assert_eq!(player.poll(), 1);
    assert_eq!(notes(&log), vec![60, 64]);
    assert_eq!(player.current_index(), 2);
    assert_eq!(player.current_time_ms(), 150.0);
    assert_eq!(player.progress(), 37.5);
    assert_eq!(player.next_deadline(), Some(1_200.0));
}

#[test]
fn test_pause_cancels_and_resume_preserves_position() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.play().unwrap();
    player.poll();
    clock.advance(150.0);
    player.poll();
    player.pause().unwrap();
    assert_eq!(player.state(), PlaybackState::Paused);
    assert!(player.next_deadline().is_none());

    // Nothing fires while paused.
    clock.advance(10_000.0);
    assert_eq!(player.poll(), 0);
    assert_eq!(player.current_time_ms(), 150.0);

    player.play().unwrap();
    // 67 is 50 ms of recording time away.
    assert_eq!(player.next_deadline(), Some(clock.now_ms() + 50.0));
    player.run(|ms| clock.advance(ms));
    assert_eq!(notes(&log), vec![60, 64, 67, 60]);
    assert_eq!(count(&log, Channel::Complete), 1);
}

#[test]
fn test_pause_requires_playing() {
    let (_clock, mut player, _log) = player_with(arpeggio());
    assert!(matches!(
        player.pause(),
        Err(ChordlabError::InvalidState { state: "idle", .. })
    ));
}

#[test]
fn test_stop_cancels_everything() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.play().unwrap();
    player.poll();
    player.stop();

    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(player.current_index(), 0);
    assert!(player.next_deadline().is_none());
    clock.advance(1_000.0);
    assert_eq!(player.poll(), 0);
    assert_eq!(notes(&log), vec![60]);

    let stops: Vec<_> = log
        .borrow()
        .iter()
        .filter_map(|(_, n)| match n {
            PlaybackNotification::Stop { reason } => Some(reason.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(stops, vec![StopReason::Requested]);
}

#[test]
fn test_stop_when_idle_still_notifies() {
    let (_clock, mut player, log) = player_with(arpeggio());
    player.stop();
    assert_eq!(count(&log, Channel::Stop), 1);
}

#[test]
fn test_seek_while_idle_prepositions() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.seek(150.0);
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(player.current_index(), 2);
    assert_eq!(player.current_time_ms(), 150.0);

    player.play().unwrap();
    player.run(|ms| clock.advance(ms));
    assert_eq!(notes(&log), vec![67, 60]);
}

#[test]
fn test_seek_while_playing_rearms() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.play().unwrap();
    player.poll();
    player.seek(200.0);
    assert_eq!(player.current_index(), 2);
    // The event exactly at the target is still due.
    assert_eq!(player.next_deadline(), Some(clock.now_ms()));
    player.run(|ms| clock.advance(ms));
    assert_eq!(notes(&log), vec![60, 67, 60]);
}

#[test]
fn test_seek_clamps_to_recording() {
    let (_clock, mut player, _log) = player_with(arpeggio());
    player.seek(-50.0);
    assert_eq!(player.current_time_ms(), 0.0);
    player.seek(9_999.0);
    assert_eq!(player.current_time_ms(), 400.0);
    assert_eq!(player.current_index(), 3);
}

#[test]
fn test_rate_change_mid_playback() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.play().unwrap();
    clock.advance(100.0);
    player.poll();
    player.set_playback_rate(0.5).unwrap();
    assert_eq!(player.current_time_ms(), 100.0);
    // 67 is 100 ms of recording time away, 200 ms at half speed.
    assert_eq!(player.next_deadline(), Some(clock.now_ms() + 200.0));
    let before = clock.now_ms();
    player.run(|ms| clock.advance(ms));
    assert_eq!(clock.now_ms() - before, 600.0);
    assert_eq!(notes(&log), vec![60, 64, 67, 60]);
}

#[test]
fn test_invalid_rates_rejected() {
    let (_clock, mut player, _log) = player_with(arpeggio());
    for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            player.set_playback_rate(rate),
            Err(ChordlabError::InvalidRate(_))
        ));
    }
    assert_eq!(player.playback_rate(), 1.0);
}

#[test]
fn test_loop_restarts_schedule() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.set_loop(true);
    player.play().unwrap();
    player.poll();
    // Two full passes plus the first event of a third.
    clock.advance(800.0);
    player.poll();

    assert_eq!(notes(&log), vec![60, 64, 67, 60, 60, 64, 67, 60, 60]);
    assert_eq!(count(&log, Channel::Complete), 2);
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.next_deadline(), Some(1_900.0));

    player.stop();
    assert!(player.next_deadline().is_none());
}

#[test]
fn test_loop_ignored_for_zero_duration() {
    let (clock, mut player, log) = player_with(recording(vec![event(EventType::NoteOn, 60, 0.0)]));
    player.set_loop(true);
    player.play().unwrap();
    player.run(|ms| clock.advance(ms));
    assert_eq!(notes(&log), vec![60]);
    assert_eq!(player.state(), PlaybackState::Idle);
}

#[test]
fn test_empty_recording_completes() {
    let (clock, mut player, log) = player_with(recording(Vec::new()));
    player.play().unwrap();
    player.run(|ms| clock.advance(ms));
    assert_eq!(count(&log, Channel::Event), 0);
    assert_eq!(count(&log, Channel::Complete), 1);
    assert_eq!(player.progress(), 100.0);
}

#[test]
fn test_play_without_recording() {
    let mut player = Player::new(ManualClock::new(0.0));
    assert!(matches!(
        player.play(),
        Err(ChordlabError::InvalidState { operation: "play", .. })
    ));
}

#[test]
fn test_load_invalid_recording_clears_player() {
    let (_clock, mut player, _log) = player_with(arpeggio());
    let mut bad = arpeggio();
    bad.duration_ms = 10.0;
    let err = player.load_recording(bad).unwrap_err();
    assert!(matches!(
        err,
        ChordlabError::InvalidRecording { ref field, .. } if field == "duration"
    ));
    assert!(player.recording().is_none());
    assert!(player.play().is_err());
}

#[test]
fn test_reload_while_playing_stops() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.play().unwrap();
    player.poll();
    player.load_recording(arpeggio()).unwrap();
    assert_eq!(player.state(), PlaybackState::Idle);
    clock.advance(1_000.0);
    assert_eq!(player.poll(), 0);

    let last = log.borrow().last().map(|(_, n)| n.clone());
    assert_eq!(
        last,
        Some(PlaybackNotification::Stop {
            reason: StopReason::Reloaded
        })
    );
}

#[test]
fn test_listener_panic_is_isolated() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.on(Channel::Event, |_| panic!("listener failure"));
    let after = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&after);
    player.on(Channel::Event, move |_| *sink.borrow_mut() += 1);

    player.play().unwrap();
    player.run(|ms| clock.advance(ms));
    assert_eq!(notes(&log).len(), 4);
    assert_eq!(*after.borrow(), 4);
    assert_eq!(count(&log, Channel::Complete), 1);
}

#[test]
fn test_off_is_idempotent() {
    let (clock, mut player, log) = player_with(arpeggio());
    let extra = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&extra);
    let id = player.on(Channel::Event, move |_| *sink.borrow_mut() += 1);
    assert!(player.off(id));
    assert!(!player.off(id));

    player.play().unwrap();
    player.run(|ms| clock.advance(ms));
    assert_eq!(*extra.borrow(), 0);
    assert_eq!(notes(&log).len(), 4);
}

#[test]
fn test_load_json() {
    let rec = arpeggio();
    let text = rec.to_json().unwrap();
    let (_clock, mut player, _log) = player_with(recording(Vec::new()));
    player.load_json(&text).unwrap();
    assert_eq!(player.recording(), Some(&rec));
    assert_eq!(player.duration_ms(), 400.0);
}

#[test]
fn test_recorder_to_player_round_trip() {
    let clock = ManualClock::new(0.0);
    let mut recorder = Recorder::new(clock.clone());
    recorder.start().unwrap();
    recorder.note_on(60, 100).unwrap();
    clock.advance(250.0);
    recorder.note_on(64, 80).unwrap();
    clock.advance(250.0);
    recorder.note_off(60).unwrap();
    recorder.note_off(64).unwrap();
    let rec = recorder.stop("", None).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut player = Player::new(clock.clone());
    player.on(Channel::Event, move |n| {
        if let PlaybackNotification::Event(e) = n {
            sink.borrow_mut().push((e.kind, e.note, e.velocity));
        }
    });
    player.load_recording(rec.clone()).unwrap();
    player.play().unwrap();
    player.run(|ms| clock.advance(ms));

    let expected: Vec<_> = rec.events.iter().map(|e| (e.kind, e.note, e.velocity)).collect();
    assert_eq!(*seen.borrow(), expected);
}

#[test]
fn test_listener_stops_looping_playback() {
    let (clock, mut player, log) = player_with(arpeggio());
    player.set_loop(true);
    let handle = player.stop_handle();
    player.on(Channel::Complete, move |_| handle.request_stop());

    player.play().unwrap();
    player.run(|ms| clock.advance(ms));

    assert_eq!(notes(&log), vec![60, 64, 67, 60]);
    assert_eq!(count(&log, Channel::Complete), 1);
    assert_eq!(count(&log, Channel::Stop), 1);
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(player.current_index(), 0);
    assert!(player.next_deadline().is_none());
}

#[test]
fn test_listener_stops_mid_recording() {
    let (clock, mut player, log) = player_with(arpeggio());
    let handle = player.stop_handle();
    let stopper = player.on(Channel::Event, move |n| {
        if let PlaybackNotification::Event(e) = n {
            if e.note == 64 {
                handle.request_stop();
            }
        }
    });

    player.play().unwrap();
    player.run(|ms| clock.advance(ms));

    assert_eq!(notes(&log), vec![60, 64]);
    assert_eq!(count(&log, Channel::Complete), 0);
    assert!(matches!(
        log.borrow().last(),
        Some((_, PlaybackNotification::Stop { reason: StopReason::Requested }))
    ));
    assert_eq!(player.state(), PlaybackState::Idle);

    // A stale request never cuts a later play short.
    assert!(player.off(stopper));
    player.stop_handle().request_stop();
    log.borrow_mut().clear();
    player.play().unwrap();
    player.run(|ms| clock.advance(ms));
    assert_eq!(notes(&log), vec![60, 64, 67, 60]);
    assert_eq!(count(&log, Channel::Complete), 1);
}
