//! Progression practice: step through a parsed progression as the player
//! plays each chord.
//!
//! A step is matched when any reading from [`identify_all`] has the step's
//! display name, so `A C E G` satisfies both an `Am7` step and a `C6` step.

use crate::identify::identify_all;
use crate::progression::{ParseResult, ProgressionStep};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PracticeOutcome {
    /// The current step was played; `index` is the new current step.
    Advanced { index: usize },
    /// The last step was played.
    Completed,
    /// The sounding notes do not match the current step.
    Waiting,
    /// The current step has no typed chord (e.g. `Cm11`) and cannot be matched.
    Unresolvable,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressionTracker {
    steps: Vec<ProgressionStep>,
    targets: Vec<Option<String>>,
    index: usize,
}

impl ProgressionTracker {
    pub fn new(steps: Vec<ProgressionStep>) -> Self {
        let targets = steps.iter().map(ProgressionStep::display_name).collect();
        Self {
            steps,
            targets,
            index: 0,
        }
    }

    /// Track a parse result. A failed parse gives an empty tracker.
    pub fn from_parse(result: &ParseResult) -> Self {
        Self::new(result.chords.clone())
    }

    pub fn steps(&self) -> &[ProgressionStep] {
        &self.steps
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&ProgressionStep> {
        self.steps.get(self.index)
    }

    /// Display name the current step expects, when it has one.
    pub fn target(&self) -> Option<&str> {
        self.targets.get(self.index)?.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.steps.len()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Compare the sounding notes with the current step.
    pub fn observe(&mut self, active_midi: &[u8]) -> PracticeOutcome {
        if self.is_complete() {
            return PracticeOutcome::Completed;
        }
        let Some(target) = self.target() else {
            return PracticeOutcome::Unresolvable;
        };
        if !identify_all(active_midi)
            .iter()
            .any(|id| id.display_name == target)
        {
            return PracticeOutcome::Waiting;
        }

        self.index += 1;
        debug!("practice step {} of {} played", self.index, self.steps.len());
        if self.is_complete() {
            PracticeOutcome::Completed
        } else {
            PracticeOutcome::Advanced { index: self.index }
        }
    }

    /// Move past the current step without playing it.
    pub fn skip(&mut self) {
        if !self.is_complete() {
            self.index += 1;
        }
    }
}
