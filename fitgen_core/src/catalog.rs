//! Exercise catalog: built-in definitions, external sources and the
//! load-once snapshot handed to the generator.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::{Lazy, OnceCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Bodyweight strength exercise; chain `with_equipment` for anything else
fn strength(
    id: &str,
    name: &str,
    sets: u32,
    reps: u32,
    muscle: &str,
    instructions: &str,
    video: &str,
) -> ExerciseDefinition {
    ExerciseDefinition {
        id: id.into(),
        name: name.into(),
        kind: ExerciseKind::Strength { sets, reps },
        muscle_group: Some(muscle.into()),
        equipment: "none".into(),
        instructions: instructions.into(),
        media: Media {
            image_url: None,
            video_url: Some(video.into()),
        },
    }
}

fn with_equipment(mut def: ExerciseDefinition, equipment: &str) -> ExerciseDefinition {
    def.equipment = equipment.into();
    def
}

fn timed(
    id: &str,
    name: &str,
    kind: ExerciseKind,
    instructions: &str,
    video: &str,
) -> ExerciseDefinition {
    ExerciseDefinition {
        id: id.into(),
        name: name.into(),
        kind,
        muscle_group: None,
        equipment: "none".into(),
        instructions: instructions.into(),
        media: Media {
            image_url: None,
            video_url: Some(video.into()),
        },
    }
}

/// Builds the built-in catalog used when no external catalog is available
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    let exercises = vec![
        strength(
            "push_ups",
            "Push-ups",
            3,
            10,
            "chest",
            "Start in a plank position with hands shoulder-width apart. Lower your body until your chest nearly touches the floor, then push back up.",
            "https://www.youtube.com/embed/IODxDxX7oi4",
        ),
        strength(
            "squats",
            "Squats",
            3,
            12,
            "legs",
            "Stand with feet shoulder-width apart. Lower your body by bending your knees and pushing your hips back as if sitting in a chair. Keep your chest up and back straight.",
            "https://www.youtube.com/embed/YaXPRqUwItQ",
        ),
        timed(
            "jumping_jacks",
            "Jumping Jacks",
            ExerciseKind::Cardio {
                duration_seconds: Some(120),
            },
            "Start with feet together and arms at your sides. Jump to a position with legs spread and arms overhead, then jump back to the starting position.",
            "https://www.youtube.com/embed/c4DAnQ6DtF8",
        ),
        timed(
            "hamstring_stretch",
            "Hamstring Stretch",
            ExerciseKind::Flexibility {
                duration_seconds: Some(60),
            },
            "Sit on the floor with one leg extended and the other bent with the sole of the foot against the inner thigh. Reach toward the toes of the extended leg.",
            "https://www.youtube.com/embed/FDwpEdxZ4H4",
        ),
        strength(
            "plank",
            "Plank",
            3,
            1,
            "core",
            "Start in a push-up position with your forearms on the ground. Keep your body in a straight line from head to heels, engaging your core muscles.",
            "https://www.youtube.com/embed/ASdvN_XEl_c",
        ),
        strength(
            "lunges",
            "Lunges",
            3,
            10,
            "legs",
            "Stand with feet hip-width apart. Step forward with one leg and lower your body until both knees are bent at 90-degree angles. Push back to the starting position and repeat with the other leg.",
            "https://www.youtube.com/embed/QOVaHwm-Q6U",
        ),
        timed(
            "mountain_climbers",
            "Mountain Climbers",
            ExerciseKind::Cardio {
                duration_seconds: Some(60),
            },
            "Start in a plank position. Bring one knee toward your chest, then quickly switch legs, as if you are running in place in a plank position.",
            "https://www.youtube.com/embed/nmwgirgXLYM",
        ),
        strength(
            "bicycle_crunches",
            "Bicycle Crunches",
            3,
            15,
            "abs",
            "Lie on your back with hands behind your head. Lift shoulders off the ground and bring one knee to your chest while rotating to touch it with the opposite elbow. Alternate sides in a pedaling motion.",
            "https://www.youtube.com/embed/9FGilxCbdz8",
        ),
        timed(
            "burpees",
            "Burpees",
            ExerciseKind::Cardio {
                duration_seconds: Some(60),
            },
            "Start standing, then squat down and place hands on the floor. Jump feet back into a plank position, perform a push-up, jump feet forward to hands, then explosively jump up with arms overhead.",
            "https://www.youtube.com/embed/TU8QYVW0gDU",
        ),
        timed(
            "shoulder_stretch",
            "Shoulder Stretch",
            ExerciseKind::Flexibility {
                duration_seconds: Some(45),
            },
            "Bring one arm across your chest and use the opposite hand to gently pull the arm closer to your body. Hold for 15-30 seconds and repeat on the other side.",
            "https://www.youtube.com/embed/bP3h_Hx7zFs",
        ),
        with_equipment(
            strength(
                "dumbbell_rows",
                "Dumbbell Rows",
                3,
                12,
                "back",
                "Bend at the waist with one knee and hand on a bench, holding a dumbbell in the other hand. Pull the dumbbell up to your side, keeping your elbow close to your body. Lower and repeat.",
                "https://www.youtube.com/embed/pYcpY20QaE8",
            ),
            "dumbbells",
        ),
        with_equipment(
            strength(
                "dumbbell_bench_press",
                "Dumbbell Bench Press",
                3,
                10,
                "chest",
                "Lie on a bench holding dumbbells at chest level. Press the weights up until your arms are fully extended, then lower them back to chest level.",
                "https://www.youtube.com/embed/VmB1G1K7v94",
            ),
            "dumbbells, bench",
        ),
    ];

    Catalog { exercises }
}

impl Catalog {
    pub fn new(exercises: Vec<ExerciseDefinition>) -> Self {
        Self { exercises }
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn count_modality(&self, modality: Modality) -> usize {
        self.exercises
            .iter()
            .filter(|e| e.modality() == modality)
            .count()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid. An empty
    /// catalog or one missing a modality is valid; the generator degrades.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for def in &self.exercises {
            if def.id.is_empty() {
                errors.push(format!("Exercise '{}' has empty ID", def.name));
            } else if !seen.insert(def.id.as_str()) {
                errors.push(format!("Duplicate exercise ID '{}'", def.id));
            }
            if def.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", def.id));
            }

            match def.kind {
                ExerciseKind::Strength { sets, reps } => {
                    if sets == 0 {
                        errors.push(format!("Exercise '{}': sets must be positive", def.id));
                    }
                    if reps == 0 {
                        errors.push(format!("Exercise '{}': reps must be positive", def.id));
                    }
                }
                ExerciseKind::Cardio { duration_seconds }
                | ExerciseKind::Flexibility { duration_seconds } => {
                    if duration_seconds == Some(0) {
                        errors.push(format!(
                            "Exercise '{}': duration must be positive",
                            def.id
                        ));
                    }
                }
            }
        }

        errors
    }
}

// ============================================================================
// Catalog Sources
// ============================================================================

/// Read side of the exercise catalog collaborator
pub trait ExerciseSource {
    fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>>;
}

/// The built-in catalog
pub struct BuiltinSource;

impl ExerciseSource for BuiltinSource {
    fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>> {
        Ok(get_default_catalog().exercises.clone())
    }
}

/// A JSON file holding an array of exercise definitions
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExerciseSource for JsonFileSource {
    fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>> {
        if !self.path.exists() {
            tracing::info!("No catalog file at {:?}", self.path);
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let exercises: Vec<ExerciseDefinition> = serde_json::from_str(&contents)?;
        tracing::info!(
            "Loaded {} exercises from {:?}",
            exercises.len(),
            self.path
        );
        Ok(exercises)
    }
}

/// Falls back to the built-in catalog when the primary source is empty
/// or unreadable
pub struct FallbackSource<S> {
    primary: S,
}

impl<S: ExerciseSource> FallbackSource<S> {
    pub fn new(primary: S) -> Self {
        Self { primary }
    }
}

impl<S: ExerciseSource> ExerciseSource for FallbackSource<S> {
    fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>> {
        match self.primary.list_exercises() {
            Ok(exercises) if !exercises.is_empty() => Ok(exercises),
            Ok(_) => {
                tracing::warn!("Catalog source returned no exercises, using built-in catalog");
                BuiltinSource.list_exercises()
            }
            Err(e) => {
                tracing::warn!("Catalog source failed: {}. Using built-in catalog.", e);
                BuiltinSource.list_exercises()
            }
        }
    }
}

impl ExerciseSource for Box<dyn ExerciseSource> {
    fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>> {
        self.as_ref().list_exercises()
    }
}

// ============================================================================
// Snapshot Handle
// ============================================================================

/// Loads a validated catalog snapshot from a source exactly once
///
/// Callers await readiness by calling `snapshot()`; the first call performs
/// the load, later calls return the same snapshot.
pub struct CatalogHandle<S> {
    source: S,
    snapshot: OnceCell<Catalog>,
}

impl<S: ExerciseSource> CatalogHandle<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: OnceCell::new(),
        }
    }

    /// Whether the snapshot has been loaded
    pub fn is_ready(&self) -> bool {
        self.snapshot.get().is_some()
    }

    /// Get the snapshot, loading and validating it on first use
    pub fn snapshot(&self) -> Result<&Catalog> {
        self.snapshot.get_or_try_init(|| {
            let catalog = Catalog::new(self.source.list_exercises()?);
            let errors = catalog.validate();
            if !errors.is_empty() {
                return Err(Error::CatalogValidation(errors.join("; ")));
            }
            tracing::debug!("Catalog snapshot ready with {} exercises", catalog.len());
            Ok(catalog)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
        exercises: Vec<ExerciseDefinition>,
    }

    impl ExerciseSource for CountingSource {
        fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.exercises.clone())
        }
    }

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.count_modality(Modality::Strength), 7);
        assert_eq!(catalog.count_modality(Modality::Cardio), 3);
        assert_eq!(catalog.count_modality(Modality::Flexibility), 2);
    }

    #[test]
    fn test_builtin_equipment() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.get("push_ups").unwrap().equipment, "none");
        assert_eq!(catalog.get("dumbbell_rows").unwrap().equipment, "dumbbells");
        assert_eq!(
            catalog.get("dumbbell_bench_press").unwrap().equipment,
            "dumbbells, bench"
        );
        assert_eq!(
            catalog.get("dumbbell_rows").unwrap().muscle_group.as_deref(),
            Some("back")
        );
    }

    #[test]
    fn test_default_catalog_validates() {
        let errors = get_default_catalog().validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_validate_reports_bad_entries() {
        let mut catalog = build_default_catalog();
        catalog.exercises.push(catalog.exercises[0].clone());
        catalog.exercises[1].kind = ExerciseKind::Strength { sets: 0, reps: 5 };
        catalog.exercises[2].kind = ExerciseKind::Cardio {
            duration_seconds: Some(0),
        };

        let errors = catalog.validate();
        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("Duplicate")));
    }

    #[test]
    fn test_empty_catalog_is_valid() {
        assert!(Catalog::default().validate().is_empty());
    }

    #[test]
    fn test_json_source_reads_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.json");
        let json = serde_json::to_string(&build_default_catalog()).unwrap();
        std::fs::write(&path, json).unwrap();

        let exercises = JsonFileSource::new(&path).list_exercises().unwrap();
        assert_eq!(exercises.len(), 12);
        assert_eq!(exercises[0].id, "push_ups");
    }

    #[test]
    fn test_json_source_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(temp_dir.path().join("nope.json"));
        assert!(source.list_exercises().unwrap().is_empty());
    }

    #[test]
    fn test_fallback_on_empty_and_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = FallbackSource::new(JsonFileSource::new(temp_dir.path().join("x.json")));
        assert_eq!(missing.list_exercises().unwrap().len(), 12);

        let bad = temp_dir.path().join("bad.json");
        std::fs::write(&bad, "{ invalid json }").unwrap();
        let broken = FallbackSource::new(JsonFileSource::new(&bad));
        assert_eq!(broken.list_exercises().unwrap().len(), 12);
    }

    #[test]
    fn test_handle_loads_once() {
        let source = CountingSource {
            calls: Cell::new(0),
            exercises: build_default_catalog().exercises,
        };
        let handle = CatalogHandle::new(source);
        assert!(!handle.is_ready());

        assert_eq!(handle.snapshot().unwrap().len(), 12);
        assert_eq!(handle.snapshot().unwrap().len(), 12);
        assert!(handle.is_ready());
        assert_eq!(handle.source.calls.get(), 1);
    }

    #[test]
    fn test_handle_rejects_invalid_catalog() {
        let mut exercises = build_default_catalog().exercises;
        exercises[0].name.clear();
        let handle = CatalogHandle::new(CountingSource {
            calls: Cell::new(0),
            exercises,
        });
        assert!(matches!(
            handle.snapshot(),
            Err(Error::CatalogValidation(_))
        ));
        assert!(!handle.is_ready());
    }
}
