//! Playback engine
//!
//! Replays a [`Recording`] against an injected [`Clock`] and [`Scheduler`],
//! emitting notifications to listeners registered per [`Channel`].
//!
//! Position accounting: while playing, the current time is
//! `position + (now - anchor) * rate`. Every state change (pause, seek,
//! rate change) first folds the elapsed wall time into `position` and then
//! re-anchors, so no transition loses or gains time.
//!
//! All remaining events are armed at once relative to one anchor. Deadlines
//! therefore do not accumulate drift from late polling.

use super::clock::Clock;
use super::timer::{Due, Scheduler, TimerQueue};
use super::types::{
    Channel, CompleteNotification, NoteNotification, PlaybackNotification, PlaybackState,
    ProgressNotification, Recording, StopReason,
};
use crate::error::{ChordlabError, Result};
use log::{debug, warn};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&PlaybackNotification)>;

/// Lets a listener stop the player that is notifying it.
///
/// Listeners only see the notification, so they capture a handle from
/// [`Player::stop_handle`] instead. The request is honoured as soon as the
/// current notification has been delivered to every listener.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.set(true);
    }

    fn take(&self) -> bool {
        self.0.replace(false)
    }
}

pub struct Player<C: Clock, S: Scheduler<usize> = TimerQueue<usize>> {
    clock: C,
    scheduler: S,
    recording: Option<Recording>,
    state: PlaybackState,
    rate: f64,
    looping: bool,
    current_index: usize,
    /// Recording time at `anchor_ms`.
    position_ms: f64,
    /// Wall time at which `position_ms` was last true. Only meaningful while playing.
    anchor_ms: f64,
    listeners: Vec<(ListenerId, Channel, Listener)>,
    next_listener: u64,
    stop_request: StopHandle,
}

impl<C: Clock> Player<C> {
    pub fn new(clock: C) -> Self {
        Self::with_scheduler(clock, TimerQueue::new())
    }
}

impl<C: Clock, S: Scheduler<usize>> Player<C, S> {
    pub fn with_scheduler(clock: C, scheduler: S) -> Self {
        Self {
            clock,
            scheduler,
            recording: None,
            state: PlaybackState::Idle,
            rate: 1.0,
            looping: false,
            current_index: 0,
            position_ms: 0.0,
            anchor_ms: 0.0,
            listeners: Vec::new(),
            next_listener: 0,
            stop_request: StopHandle::default(),
        }
    }

    // Listeners

    /// Register a listener on one channel.
    ///
    /// A panicking listener is logged and skipped; it never interrupts
    /// scheduling or the listeners after it.
    pub fn on<F>(&mut self, channel: Channel, listener: F) -> ListenerId
    where
        F: FnMut(&PlaybackNotification) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, channel, Box::new(listener)));
        id
    }

    /// Remove a listener. Removing an unknown id is a no-op returning `false`.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop_request.clone()
    }

    fn emit(&mut self, notification: PlaybackNotification) {
        let channel = notification.channel();
        for (id, _, listener) in self.listeners.iter_mut().filter(|(_, c, _)| *c == channel) {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(&notification)));
            if result.is_err() {
                warn!("playback listener {:?} on {:?} panicked", id, channel);
            }
        }
    }

    // Loading

    /// Replace the loaded recording. Any active playback is stopped first.
    ///
    /// If the document is invalid the player is left with no recording.
    pub fn load_recording(&mut self, recording: Recording) -> Result<()> {
        let was_active = self.state != PlaybackState::Idle;
        self.scheduler.cancel_all();
        self.reset();
        if was_active {
            self.emit(PlaybackNotification::Stop {
                reason: StopReason::Reloaded,
            });
        }

        if let Err(err) = recording.validate() {
            self.recording = None;
            return Err(err);
        }
        debug!(
            "loaded recording {} ({} events, {:.1} ms)",
            recording.id,
            recording.events.len(),
            recording.duration_ms
        );
        self.recording = Some(recording);
        Ok(())
    }

    /// Parse, validate and load a recording document.
    pub fn load_json(&mut self, text: &str) -> Result<()> {
        let recording = Recording::from_json(text)?;
        self.load_recording(recording)
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    // Transport

    pub fn play(&mut self) -> Result<()> {
        if self.recording.is_none() {
            return Err(ChordlabError::InvalidState {
                operation: "play",
                state: "no recording is loaded",
            });
        }
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        debug!(
            "play from {} at {:.1} ms (rate {})",
            self.state.as_str(),
            self.position_ms,
            self.rate
        );
        self.stop_request.take();
        self.state = PlaybackState::Playing;
        self.anchor_ms = self.clock.now_ms();
        self.arm();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Err(ChordlabError::InvalidState {
                operation: "pause playback",
                state: self.state.as_str(),
            });
        }
        self.position_ms = self.current_time_ms();
        self.scheduler.cancel_all();
        self.state = PlaybackState::Paused;
        debug!("paused at {:.1} ms", self.position_ms);
        Ok(())
    }

    /// Stop and rewind. Valid in every state and always notifies `Stop`.
    pub fn stop(&mut self) {
        self.scheduler.cancel_all();
        self.reset();
        debug!("stopped");
        self.emit(PlaybackNotification::Stop {
            reason: StopReason::Requested,
        });
    }

    /// Move to `target_ms`, clamped to the recording. The next event is the
    /// first one at or after the target.
    pub fn seek(&mut self, target_ms: f64) {
        let duration = self.duration_ms();
        let target = if target_ms.is_finite() {
            target_ms.clamp(0.0, duration)
        } else {
            0.0
        };
        self.scheduler.cancel_all();
        self.position_ms = target;
        self.current_index = self
            .recording
            .as_ref()
            .map_or(0, |r| r.events.partition_point(|e| e.timestamp_ms < target));
        debug!("seek to {:.1} ms, next event {}", target, self.current_index);
        if self.state == PlaybackState::Playing {
            self.anchor_ms = self.clock.now_ms();
            self.arm();
        }
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ChordlabError::InvalidRate(rate));
        }
        if self.state == PlaybackState::Playing {
            self.position_ms = self.current_time_ms();
            self.anchor_ms = self.clock.now_ms();
            self.rate = rate;
            self.scheduler.cancel_all();
            self.arm();
        } else {
            self.rate = rate;
        }
        Ok(())
    }

    /// In loop mode the schedule restarts from the first event after the
    /// last one fires. Recordings of zero duration never loop.
    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    // Accessors

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn duration_ms(&self) -> f64 {
        self.recording.as_ref().map_or(0.0, |r| r.duration_ms)
    }

    /// Position in recording time.
    pub fn current_time_ms(&self) -> f64 {
        let position = match self.state {
            PlaybackState::Playing => {
                self.position_ms + (self.clock.now_ms() - self.anchor_ms).max(0.0) * self.rate
            }
            _ => self.position_ms,
        };
        position.min(self.duration_ms())
    }

    /// Percentage in `0..=100`.
    pub fn progress(&self) -> f64 {
        percent(self.current_time_ms(), self.duration_ms())
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.scheduler.next_deadline()
    }

    // Driving

    /// Fire every timer that is due. Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;
        while let Some(due) = self.scheduler.pop_due(now) {
            self.fire(due);
            fired += 1;
        }
        fired
    }

    /// Drive playback until it is no longer playing.
    ///
    /// `wait` is called with the number of milliseconds until the next
    /// deadline; a real host sleeps, a test advances its clock. In loop mode
    /// this only returns once a listener stops the player through a
    /// [`StopHandle`].
    pub fn run<W: FnMut(f64)>(&mut self, mut wait: W) {
        while self.state == PlaybackState::Playing {
            let Some(deadline) = self.scheduler.next_deadline() else {
                break;
            };
            let now = self.clock.now_ms();
            if deadline > now {
                wait(deadline - now);
            }
            self.poll();
        }
    }

    // Internals

    fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.current_index = 0;
        self.position_ms = 0.0;
    }

    /// Arm one timer per remaining event, relative to the current anchor.
    /// An empty recording gets one timer so it still completes.
    fn arm(&mut self) {
        let Some(recording) = &self.recording else {
            return;
        };
        if recording.events.is_empty() {
            self.scheduler.defer(self.anchor_ms, 0.0, 0);
            return;
        }
        for (i, event) in recording.events.iter().enumerate().skip(self.current_index) {
            let delay = (event.timestamp_ms - self.position_ms) / self.rate;
            self.scheduler.defer(self.anchor_ms, delay, i);
        }
    }

    fn fire(&mut self, due: Due<usize>) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(recording) = &self.recording else {
            self.fail("timer fired with no recording loaded");
            return;
        };
        let total = recording.events.len();
        let duration_ms = recording.duration_ms;
        if total == 0 {
            self.complete(due.deadline_ms, 0, duration_ms);
            return;
        }
        let Some(event) = recording.events.get(due.task) else {
            let message = format!("timer for missing event {}", due.task);
            self.fail(&message);
            return;
        };

        let note = NoteNotification::from(event);
        let at_ms = event.timestamp_ms;
        self.current_index = due.task + 1;
        self.emit(PlaybackNotification::Event(note));
        self.emit(PlaybackNotification::Progress(ProgressNotification {
            progress: percent(at_ms, duration_ms),
            current_time_ms: at_ms,
            duration_ms,
        }));
        if self.honour_stop_request() {
            return;
        }

        if due.task + 1 == total {
            self.complete(due.deadline_ms, total, duration_ms);
        }
    }

    fn complete(&mut self, deadline_ms: f64, total_events: usize, duration_ms: f64) {
        self.emit(PlaybackNotification::Complete(CompleteNotification {
            duration_ms,
            total_events,
        }));
        if self.honour_stop_request() {
            return;
        }
        if self.looping && duration_ms > 0.0 {
            debug!("looping");
            self.current_index = 0;
            self.position_ms = 0.0;
            self.anchor_ms = deadline_ms;
            self.arm();
        } else {
            debug!("playback complete");
            self.scheduler.cancel_all();
            self.reset();
        }
    }

    fn honour_stop_request(&mut self) -> bool {
        if !self.stop_request.take() {
            return false;
        }
        debug!("stop requested by a listener");
        self.stop();
        true
    }

    fn fail(&mut self, message: &str) {
        warn!("playback aborted: {}", message);
        self.scheduler.cancel_all();
        self.reset();
        self.emit(PlaybackNotification::Stop {
            reason: StopReason::Error(message.to_string()),
        });
    }
}

fn percent(time_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms > 0.0 {
        (time_ms / duration_ms * 100.0).clamp(0.0, 100.0)
    } else {
        100.0
    }
}
