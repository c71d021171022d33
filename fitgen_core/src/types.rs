//! Core domain types for the fitgen system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise definitions (catalog templates) and per-workout instances
//! - Workouts and their focus rotation
//! - User profile input to the generator
//! - Progress entries emitted by finished sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Seconds credited per strength repetition (time under tension plus transition)
pub const SECONDS_PER_REP: u32 = 45;

/// Duration assumed for cardio/flexibility exercises without an explicit one
pub const DEFAULT_TIMED_SECONDS: u32 = 60;

// ============================================================================
// Exercise Types
// ============================================================================

/// Exercise category determining timing and set/rep semantics
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Strength,
    Cardio,
    Flexibility,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Modality::Strength => "strength",
            Modality::Cardio => "cardio",
            Modality::Flexibility => "flexibility",
        })
    }
}

/// Timing metadata keyed by modality
///
/// Strength work is prescribed in sets and reps; cardio and flexibility are
/// prescribed as a duration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "modality", rename_all = "snake_case")]
pub enum ExerciseKind {
    Strength {
        sets: u32,
        reps: u32,
    },
    Cardio {
        #[serde(default)]
        duration_seconds: Option<u32>,
    },
    Flexibility {
        #[serde(default)]
        duration_seconds: Option<u32>,
    },
}

impl ExerciseKind {
    pub fn modality(&self) -> Modality {
        match self {
            ExerciseKind::Strength { .. } => Modality::Strength,
            ExerciseKind::Cardio { .. } => Modality::Cardio,
            ExerciseKind::Flexibility { .. } => Modality::Flexibility,
        }
    }

    /// Seconds this exercise contributes to a workout's total duration
    pub fn estimated_seconds(&self) -> u32 {
        match self {
            ExerciseKind::Strength { sets, reps } => {
                sets.saturating_mul(*reps).saturating_mul(SECONDS_PER_REP)
            }
            ExerciseKind::Cardio { duration_seconds }
            | ExerciseKind::Flexibility { duration_seconds } => {
                duration_seconds.unwrap_or(DEFAULT_TIMED_SECONDS)
            }
        }
    }

    /// Whether leaving the exercise requires its timer to finish first
    pub fn is_timer_gated(&self) -> bool {
        !matches!(self, ExerciseKind::Strength { .. })
    }

    /// Short human-readable prescription, e.g. "3 sets × 10 reps"
    pub fn prescription(&self) -> String {
        match self {
            ExerciseKind::Strength { sets, reps } => format!("{} sets × {} reps", sets, reps),
            _ => {
                let secs = self.estimated_seconds();
                if secs % 60 == 0 {
                    format!("{} min", secs / 60)
                } else {
                    format!("{} sec", secs)
                }
            }
        }
    }
}

/// Demonstration media for an exercise
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Media {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// A reusable exercise template owned by the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: ExerciseKind,
    #[serde(default)]
    pub muscle_group: Option<String>,
    #[serde(default = "default_equipment")]
    pub equipment: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub media: Media,
}

fn default_equipment() -> String {
    "none".into()
}

impl ExerciseDefinition {
    pub fn modality(&self) -> Modality {
        self.kind.modality()
    }
}

/// A copy of a definition bound into one workout with its own identity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseInstance {
    pub id: Uuid,
    pub definition: ExerciseDefinition,
}

impl ExerciseInstance {
    /// Clone a definition into a fresh instance with a newly minted id
    pub fn from_definition(definition: &ExerciseDefinition) -> Self {
        Self {
            id: Uuid::new_v4(),
            definition: definition.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn kind(&self) -> &ExerciseKind {
        &self.definition.kind
    }

    pub fn modality(&self) -> Modality {
        self.definition.modality()
    }
}

// ============================================================================
// Workout Types
// ============================================================================

/// Focus of a generated workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutFocus {
    Strength,
    Cardio,
    Flexibility,
    FullBody,
}

impl WorkoutFocus {
    /// Fixed rotation used when assigning focus by workout index
    pub const ROTATION: [WorkoutFocus; 4] = [
        WorkoutFocus::Strength,
        WorkoutFocus::Cardio,
        WorkoutFocus::Flexibility,
        WorkoutFocus::FullBody,
    ];

    pub fn for_index(index: usize) -> Self {
        Self::ROTATION[index % Self::ROTATION.len()]
    }

    /// Whether a definition of the given modality belongs in this workout
    pub fn accepts(&self, modality: Modality) -> bool {
        match self {
            WorkoutFocus::Strength => modality == Modality::Strength,
            WorkoutFocus::Cardio => modality == Modality::Cardio,
            WorkoutFocus::Flexibility => modality == Modality::Flexibility,
            WorkoutFocus::FullBody => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkoutFocus::Strength => "Strength",
            WorkoutFocus::Cardio => "Cardio",
            WorkoutFocus::Flexibility => "Flexibility",
            WorkoutFocus::FullBody => "Full Body",
        }
    }
}

/// Self-reported fitness level, stamped on workouts as their difficulty
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitnessLevel::Beginner => write!(f, "beginner"),
            FitnessLevel::Intermediate => write!(f, "intermediate"),
            FitnessLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for FitnessLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(FitnessLevel::Beginner),
            "intermediate" => Ok(FitnessLevel::Intermediate),
            "advanced" => Ok(FitnessLevel::Advanced),
            other => Err(crate::Error::Other(format!(
                "Unknown fitness level: {}",
                other
            ))),
        }
    }
}

/// A generated workout: an ordered sequence of exercise instances
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub focus: WorkoutFocus,
    pub difficulty: FitnessLevel,
    pub exercises: Vec<ExerciseInstance>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// Total duration derived from the exercises
    pub fn total_duration_seconds(&self) -> u32 {
        self.exercises
            .iter()
            .map(|e| e.kind().estimated_seconds())
            .fold(0u32, u32::saturating_add)
    }

    /// Duration rounded up to whole minutes, for display
    pub fn duration_minutes(&self) -> u32 {
        self.total_duration_seconds().div_ceil(60)
    }
}

// ============================================================================
// Profile Types
// ============================================================================

/// Demographic and preference data collected by the questionnaire
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub height_cm: Option<f32>,
    #[serde(default)]
    pub weight_kg: Option<f32>,
    pub fitness_level: FitnessLevel,
    #[serde(default)]
    pub fitness_goals: Vec<String>,
    /// Workouts per week
    #[serde(default)]
    pub workout_frequency: Option<u8>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub equipment_access: Vec<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    /// Preferred workout length in minutes
    #[serde(default)]
    pub workout_duration_minutes: Option<u32>,
    #[serde(default)]
    pub workout_time: Option<String>,
    #[serde(default)]
    pub rest_days: Vec<String>,
}

// ============================================================================
// Progress Types
// ============================================================================

/// A 1-5 star session rating
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = crate::Error;

    fn try_from(value: u8) -> crate::Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(crate::Error::InvalidRating(value))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

/// Summary of one finished (or abandoned-but-submitted) session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub workout_id: Uuid,
    pub workout_name: String,
    pub completed: bool,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Seconds spent per exercise instance id
    #[serde(default)]
    pub exercise_time_spent: BTreeMap<Uuid, u32>,
}

impl ProgressEntry {
    pub fn total_seconds(&self) -> u32 {
        self.exercise_time_spent
            .values()
            .fold(0u32, |acc, s| acc.saturating_add(*s))
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// A read-only snapshot of exercise definitions, in catalog order
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog {
    pub exercises: Vec<ExerciseDefinition>,
}
