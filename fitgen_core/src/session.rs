//! Workout session state machine.
//!
//! Walks a user through one workout's exercises in order, inserting a rest
//! phase between consecutive exercises and gating forward navigation on the
//! active clock. Only one clock exists at a time.
//!
//! ```text
//! NotStarted -> Exercising(0) -> Resting(1) -> Exercising(1) -> ... -> Exercising(n-1) -> Finished
//! ```

use crate::clock::{ClockEvent, SessionClock};
use crate::store::WorkoutStore;
use crate::wal::ProgressRecorder;
use crate::{Error, ExerciseInstance, ProgressEntry, Rating, Result, Workout};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Rest inserted between consecutive exercises
pub const REST_SECONDS: u32 = 30;

/// Where the session currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Exercising { index: usize },
    /// Resting before the exercise at `next`
    Resting { next: usize },
    Finished,
}

/// Rating and notes collected once the workout is finished
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Feedback {
    pub rating: Option<Rating>,
    pub notes: Option<String>,
}

/// A single user's pass through one workout
#[derive(Debug)]
pub struct WorkoutSession {
    workout: Workout,
    phase: Phase,
    clock: Option<SessionClock>,
    can_advance: bool,
    exercise_time_spent: BTreeMap<Uuid, u32>,
    rest_seconds: u32,
    rests_entered: usize,
    entry: Option<ProgressEntry>,
    progress_recorded: bool,
    completion_marked: bool,
}

impl WorkoutSession {
    pub fn new(workout: Workout) -> Self {
        Self {
            workout,
            phase: Phase::NotStarted,
            clock: None,
            can_advance: false,
            exercise_time_spent: BTreeMap::new(),
            rest_seconds: REST_SECONDS,
            rests_entered: 0,
            entry: None,
            progress_recorded: false,
            completion_marked: false,
        }
    }

    /// Open a session for a workout in the current collection
    pub fn for_workout(workouts: &[Workout], id: Uuid) -> Result<Self> {
        workouts
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .map(Self::new)
            .ok_or_else(|| Error::WorkoutNotFound(id.to_string()))
    }

    pub fn with_rest_seconds(mut self, rest_seconds: u32) -> Self {
        self.rest_seconds = rest_seconds;
        self
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn can_advance(&self) -> bool {
        self.can_advance
    }

    pub fn clock(&self) -> Option<&SessionClock> {
        self.clock.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Number of rest phases entered so far
    pub fn rests_entered(&self) -> usize {
        self.rests_entered
    }

    pub fn exercise_time_spent(&self) -> &BTreeMap<Uuid, u32> {
        &self.exercise_time_spent
    }

    /// Recorded seconds for an exercise instance (zero if none)
    pub fn time_spent(&self, exercise_id: Uuid) -> u32 {
        self.exercise_time_spent
            .get(&exercise_id)
            .copied()
            .unwrap_or(0)
    }

    /// The exercise being performed, or coming up after the current rest
    pub fn current_exercise(&self) -> Option<&ExerciseInstance> {
        match self.phase {
            Phase::Exercising { index } | Phase::Resting { next: index } => {
                self.workout.exercises.get(index)
            }
            _ => None,
        }
    }

    fn last_index(&self) -> usize {
        self.workout.exercises.len().saturating_sub(1)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// NotStarted -> Exercising(0). A workout without exercises finishes
    /// immediately.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::NotStarted {
            return false;
        }
        if self.workout.exercises.is_empty() {
            tracing::warn!("Workout {} has no exercises", self.workout.name);
            self.phase = Phase::Finished;
            return true;
        }
        tracing::info!("Starting workout {}", self.workout.name);
        self.enter_exercise(0);
        true
    }

    /// Forward action. Returns false when the gate is closed.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        if !self.can_advance {
            return false;
        }
        match self.phase {
            Phase::Exercising { index } => {
                self.leave_exercise(index);
                if index < self.last_index() {
                    self.enter_rest(index + 1, now);
                } else {
                    self.clock = None;
                    self.can_advance = false;
                    self.phase = Phase::Finished;
                    tracing::info!("Workout {} finished", self.workout.name);
                }
                true
            }
            Phase::Resting { next } => {
                self.enter_exercise(next);
                true
            }
            Phase::NotStarted | Phase::Finished => false,
        }
    }

    /// Backward action. Earlier progress on the target exercise is not
    /// restored to its clock.
    pub fn back(&mut self) -> bool {
        match self.phase {
            Phase::Exercising { index } if index > 0 => {
                self.enter_exercise(index - 1);
                true
            }
            Phase::Resting { next } => {
                self.enter_exercise(next - 1);
                true
            }
            _ => false,
        }
    }

    fn enter_exercise(&mut self, index: usize) {
        let exercise = &self.workout.exercises[index];
        let kind = exercise.kind();
        tracing::debug!(
            "Exercise {} of {}: {}",
            index + 1,
            self.workout.exercises.len(),
            exercise.name()
        );
        self.clock = Some(SessionClock::new(kind.estimated_seconds()));
        self.can_advance = !kind.is_timer_gated();
        self.phase = Phase::Exercising { index };
    }

    fn leave_exercise(&mut self, index: usize) {
        let id = self.workout.exercises[index].id;
        self.exercise_time_spent.entry(id).or_insert(0);
    }

    fn enter_rest(&mut self, next: usize, now: DateTime<Utc>) {
        let mut clock = SessionClock::new(self.rest_seconds);
        clock.start(now);
        self.clock = Some(clock);
        self.can_advance = false;
        self.rests_entered += 1;
        self.phase = Phase::Resting { next };
        tracing::debug!("Resting {}s before exercise {}", self.rest_seconds, next + 1);
    }

    // ------------------------------------------------------------------
    // Clock controls
    // ------------------------------------------------------------------

    pub fn start_timer(&mut self, now: DateTime<Utc>) -> bool {
        self.clock.as_mut().is_some_and(|c| c.start(now))
    }

    pub fn pause_timer(&mut self, now: DateTime<Utc>) -> bool {
        self.clock.as_mut().is_some_and(|c| c.pause(now))
    }

    pub fn resume_timer(&mut self, now: DateTime<Utc>) -> bool {
        self.clock.as_mut().is_some_and(|c| c.resume(now))
    }

    pub fn reset_timer(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.reset();
        }
    }

    /// One second elapsed on the active clock
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<ClockEvent> {
        let event = self.clock.as_mut()?.tick(now)?;
        self.handle(event);
        Some(event)
    }

    pub fn finish_timer(&mut self, now: DateTime<Utc>) -> Option<ClockEvent> {
        let event = self.clock.as_mut()?.finish(now)?;
        self.handle(event);
        Some(event)
    }

    /// Skip the current exercise or rest without reporting time
    pub fn skip(&mut self) -> Option<ClockEvent> {
        let event = self.clock.as_mut()?.skip()?;
        self.handle(event);
        Some(event)
    }

    fn handle(&mut self, event: ClockEvent) {
        if !event.is_done() {
            return;
        }
        self.can_advance = true;

        if let Phase::Exercising { index } = self.phase {
            let id = self.workout.exercises[index].id;
            match event.elapsed_seconds() {
                Some(seconds) => {
                    self.exercise_time_spent.insert(id, seconds);
                    tracing::debug!("Recorded {}s for exercise {}", seconds, id);
                }
                None => {
                    self.exercise_time_spent.entry(id).or_insert(0);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Report the finished session and mark the workout completed
    ///
    /// The workout is marked completed locally before anything is persisted.
    /// On a persistence error the session stays finished and keeps the built
    /// entry; calling again retries only the steps that failed.
    pub fn submit<P, S>(
        &mut self,
        feedback: Feedback,
        recorder: &mut P,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<ProgressEntry>
    where
        P: ProgressRecorder + ?Sized,
        S: WorkoutStore + ?Sized,
    {
        if self.phase != Phase::Finished {
            return Err(Error::Session(format!(
                "cannot submit in phase {:?}",
                self.phase
            )));
        }

        self.workout.completed = true;

        let time_spent = self.exercise_time_spent.clone();
        let workout = &self.workout;
        let entry = self.entry.get_or_insert_with(|| ProgressEntry {
            id: Uuid::new_v4(),
            date: now,
            workout_id: workout.id,
            workout_name: workout.name.clone(),
            completed: true,
            rating: None,
            notes: None,
            exercise_time_spent: time_spent,
        });
        if !self.progress_recorded {
            entry.rating = feedback.rating;
            entry.notes = feedback.notes.filter(|n| !n.trim().is_empty());
        }

        if !self.progress_recorded {
            recorder
                .record_progress(entry)
                .map_err(|e| Error::Persistence(format!("recording progress: {}", e)))?;
            self.progress_recorded = true;
        }

        if !self.completion_marked {
            store
                .mark_completed(self.workout.id)
                .map_err(|e| Error::Persistence(format!("marking workout completed: {}", e)))?;
            self.completion_marked = true;
        }

        tracing::info!("Submitted progress for {}", self.workout.name);
        Ok(entry.clone())
    }

    /// Leave the session early
    ///
    /// The active clock and any unreported time for the current exercise
    /// are discarded. Returns an uncompleted entry with the times recorded
    /// so far, or None if the session never started.
    pub fn abandon(self, now: DateTime<Utc>) -> Option<ProgressEntry> {
        if self.phase == Phase::NotStarted {
            return None;
        }
        tracing::info!("Abandoned workout {}", self.workout.name);
        Some(ProgressEntry {
            id: Uuid::new_v4(),
            date: now,
            workout_id: self.workout.id,
            workout_name: self.workout.name,
            completed: false,
            rating: None,
            notes: None,
            exercise_time_spent: self.exercise_time_spent,
        })
    }
}
