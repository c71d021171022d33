//! Workout generator: turns a profile and a catalog snapshot into a plan.
//!
//! Each invocation produces a fixed number of workouts whose focus cycles
//! through strength, cardio, flexibility and full-body. Exercises are drawn
//! without replacement from the focus-filtered catalog, so a thin catalog
//! yields shorter workouts instead of an error.

use crate::store::WorkoutStore;
use crate::{
    Catalog, Error, ExerciseDefinition, ExerciseInstance, Result, UserProfile, Workout,
    WorkoutFocus,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Number of workouts produced per invocation
pub const WORKOUTS_PER_PLAN: usize = 5;

/// Requested exercise count per workout, drawn uniformly
pub const EXERCISES_PER_WORKOUT: RangeInclusive<usize> = 5..=8;

/// Generate a fresh plan of workouts
///
/// The catalog is only read; the pool for each workout is a filtered copy
/// of references into it.
pub fn generate<R: Rng>(
    profile: &UserProfile,
    catalog: &Catalog,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Workout> {
    tracing::info!(
        "Generating {} workouts from {} catalog exercises ({} level)",
        WORKOUTS_PER_PLAN,
        catalog.len(),
        profile.fitness_level
    );

    (0..WORKOUTS_PER_PLAN)
        .map(|index| build_workout(index, profile, catalog, rng, now))
        .collect()
}

fn build_workout<R: Rng>(
    index: usize,
    profile: &UserProfile,
    catalog: &Catalog,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Workout {
    let focus = WorkoutFocus::for_index(index);
    let requested = rng.gen_range(EXERCISES_PER_WORKOUT);

    let pool: Vec<&ExerciseDefinition> = catalog
        .exercises
        .iter()
        .filter(|def| focus.accepts(def.modality()))
        .collect();

    let exercises = draw_exercises(pool, requested, rng);
    if exercises.len() < requested {
        tracing::debug!(
            "{} workout {}: catalog only had {} of {} requested exercises",
            focus.label(),
            index + 1,
            exercises.len(),
            requested
        );
    }

    Workout {
        id: Uuid::new_v4(),
        name: format!("{} Workout {}", focus.label(), index + 1),
        focus,
        difficulty: profile.fitness_level,
        exercises,
        completed: false,
        created_at: now,
    }
}

/// Draw up to `count` definitions uniformly without replacement
fn draw_exercises<R: Rng>(
    mut pool: Vec<&ExerciseDefinition>,
    count: usize,
    rng: &mut R,
) -> Vec<ExerciseInstance> {
    let mut drawn = Vec::with_capacity(count.min(pool.len()));
    while drawn.len() < count && !pool.is_empty() {
        let idx = rng.gen_range(0..pool.len());
        let def = pool.remove(idx);
        drawn.push(ExerciseInstance::from_definition(def));
    }
    drawn
}

/// Outcome of handing a generated plan to the workout store
#[derive(Clone, Debug, Default)]
pub struct GenerationReport {
    pub generated: usize,
    pub persisted: usize,
    pub failures: Vec<(Uuid, String)>,
}

impl GenerationReport {
    pub fn is_partial_failure(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Holds the current in-memory workout collection
#[derive(Clone, Debug, Default)]
pub struct WorkoutPlanner {
    workouts: Vec<Workout>,
}

impl WorkoutPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_workouts(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    /// Generate a new plan, replacing the held collection
    ///
    /// Every workout is handed to the store; a failed write is logged and
    /// reported but the workout stays in the in-memory collection.
    pub fn regenerate<R, S>(
        &mut self,
        profile: &UserProfile,
        catalog: &Catalog,
        store: &mut S,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> GenerationReport
    where
        R: Rng,
        S: WorkoutStore + ?Sized,
    {
        let workouts = generate(profile, catalog, rng, now);
        let mut report = GenerationReport {
            generated: workouts.len(),
            ..Default::default()
        };

        for workout in &workouts {
            match store.create_workout(workout) {
                Ok(_) => report.persisted += 1,
                Err(e) => {
                    tracing::warn!("Failed to persist workout {}: {}", workout.name, e);
                    report.failures.push((workout.id, e.to_string()));
                }
            }
        }

        self.workouts = workouts;
        report
    }

    pub fn find(&self, id: Uuid) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Look up a workout, reporting a missing id as `WorkoutNotFound`
    pub fn get(&self, id: Uuid) -> Result<&Workout> {
        self.find(id)
            .ok_or_else(|| Error::WorkoutNotFound(id.to_string()))
    }

    /// First workout not yet completed
    pub fn next_workout(&self) -> Option<&Workout> {
        self.workouts.iter().find(|w| !w.completed)
    }

    /// Set the completed flag locally
    pub fn mark_completed(&mut self, id: Uuid) -> Result<()> {
        let workout = self
            .workouts
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::WorkoutNotFound(id.to_string()))?;
        workout.completed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::{ExerciseKind, FitnessLevel, Media, Modality};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn def(id: &str, kind: ExerciseKind) -> ExerciseDefinition {
        ExerciseDefinition {
            id: id.into(),
            name: id.into(),
            kind,
            muscle_group: None,
            equipment: "none".into(),
            instructions: String::new(),
            media: Media::default(),
        }
    }

    fn small_catalog() -> Catalog {
        Catalog::new(vec![
            def("s1", ExerciseKind::Strength { sets: 3, reps: 10 }),
            def("s2", ExerciseKind::Strength { sets: 2, reps: 8 }),
            def("c1", ExerciseKind::Cardio { duration_seconds: Some(120) }),
            def("c2", ExerciseKind::Cardio { duration_seconds: None }),
            def("f1", ExerciseKind::Flexibility { duration_seconds: Some(45) }),
            def("f2", ExerciseKind::Flexibility { duration_seconds: Some(60) }),
        ])
    }

    fn beginner() -> UserProfile {
        UserProfile {
            name: "Test".into(),
            fitness_level: FitnessLevel::Beginner,
            ..Default::default()
        }
    }

    /// Store that fails for selected call indices
    struct FlakyStore {
        calls: usize,
        fail_on: Vec<usize>,
        saved: Vec<Uuid>,
    }

    impl WorkoutStore for FlakyStore {
        fn create_workout(&mut self, workout: &Workout) -> Result<Uuid> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_on.contains(&call) {
                return Err(Error::Persistence("backend unavailable".into()));
            }
            self.saved.push(workout.id);
            Ok(workout.id)
        }

        fn list_workouts(&self) -> Result<Vec<Workout>> {
            Ok(Vec::new())
        }

        fn mark_completed(&mut self, _id: Uuid) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_generates_five_workouts_with_rotation() {
        crate::logging::init_test();
        let mut rng = StdRng::seed_from_u64(7);
        let workouts = generate(&beginner(), &build_default_catalog(), &mut rng, Utc::now());

        assert_eq!(workouts.len(), 5);
        let focuses: Vec<_> = workouts.iter().map(|w| w.focus).collect();
        assert_eq!(
            focuses,
            vec![
                WorkoutFocus::Strength,
                WorkoutFocus::Cardio,
                WorkoutFocus::Flexibility,
                WorkoutFocus::FullBody,
                WorkoutFocus::Strength,
            ]
        );
        for w in &workouts {
            assert!(!w.completed);
            assert_eq!(w.difficulty, FitnessLevel::Beginner);
            assert!(w.exercises.len() <= 8);
        }
        // Full-body draws from all 12 definitions, so it always meets the request
        assert!(workouts[3].exercises.len() >= 5);
    }

    #[test]
    fn test_exercises_match_focus_and_are_unique() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let workouts = generate(&beginner(), &build_default_catalog(), &mut rng, Utc::now());
            for w in &workouts {
                let instance_ids: HashSet<_> = w.exercises.iter().map(|e| e.id).collect();
                assert_eq!(instance_ids.len(), w.exercises.len());

                let template_ids: HashSet<_> =
                    w.exercises.iter().map(|e| e.definition.id.as_str()).collect();
                assert_eq!(template_ids.len(), w.exercises.len(), "drawn with replacement");

                for e in &w.exercises {
                    assert!(w.focus.accepts(e.modality()));
                    assert_ne!(e.id.to_string(), e.definition.id);
                }
            }
        }
    }

    #[test]
    fn test_small_catalog_caps_exercise_count() {
        let catalog = small_catalog();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let workouts = generate(&beginner(), &catalog, &mut rng, Utc::now());
            assert_eq!(workouts.len(), 5);

            let flexibility = &workouts[2];
            assert_eq!(flexibility.focus, WorkoutFocus::Flexibility);
            assert_eq!(flexibility.exercises.len(), 2);
            assert!(flexibility
                .exercises
                .iter()
                .all(|e| e.modality() == Modality::Flexibility));

            assert_eq!(workouts[0].exercises.len(), 2);
            assert_eq!(workouts[1].exercises.len(), 2);
            let full_body = workouts[3].exercises.len();
            assert!((5..=6).contains(&full_body), "got {}", full_body);
        }
    }

    #[test]
    fn test_empty_catalog_yields_empty_workouts() {
        let mut rng = StdRng::seed_from_u64(1);
        let workouts = generate(&beginner(), &Catalog::default(), &mut rng, Utc::now());
        assert_eq!(workouts.len(), 5);
        assert!(workouts.iter().all(|w| w.exercises.is_empty()));
        assert!(workouts.iter().all(|w| w.total_duration_seconds() == 0));
    }

    #[test]
    fn test_catalog_is_not_mutated() {
        let catalog = small_catalog();
        let before = catalog.clone();
        let mut rng = StdRng::seed_from_u64(3);
        generate(&beginner(), &catalog, &mut rng, Utc::now());
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_total_duration() {
        let mut rng = StdRng::seed_from_u64(11);
        let workouts = generate(&beginner(), &small_catalog(), &mut rng, Utc::now());

        // Strength: 3*10*45 + 2*8*45
        assert_eq!(workouts[0].total_duration_seconds(), 1350 + 720);
        // Cardio: 120 + default 60
        assert_eq!(workouts[1].total_duration_seconds(), 180);
        // Flexibility: 45 + 60
        assert_eq!(workouts[2].total_duration_seconds(), 105);
        assert_eq!(workouts[2].duration_minutes(), 2);
    }

    #[test]
    fn test_regenerate_replaces_collection() {
        let mut planner = WorkoutPlanner::new();
        let mut store = FlakyStore {
            calls: 0,
            fail_on: vec![],
            saved: vec![],
        };
        let mut rng = StdRng::seed_from_u64(5);
        let catalog = build_default_catalog();

        planner.regenerate(&beginner(), &catalog, &mut store, &mut rng, Utc::now());
        let first: HashSet<Uuid> = planner
            .workouts()
            .iter()
            .flat_map(|w| w.exercises.iter().map(|e| e.id))
            .collect();

        planner.regenerate(&beginner(), &catalog, &mut store, &mut rng, Utc::now());
        assert_eq!(planner.workouts().len(), 5);

        let second: HashSet<Uuid> = planner
            .workouts()
            .iter()
            .flat_map(|w| w.exercises.iter().map(|e| e.id))
            .collect();
        assert!(first.is_disjoint(&second));
        assert_eq!(store.saved.len(), 10);
    }

    #[test]
    fn test_partial_persistence_failure_keeps_all_workouts() {
        let mut planner = WorkoutPlanner::new();
        let mut store = FlakyStore {
            calls: 0,
            fail_on: vec![1, 3],
            saved: vec![],
        };
        let mut rng = StdRng::seed_from_u64(9);

        let report = planner.regenerate(
            &beginner(),
            &build_default_catalog(),
            &mut store,
            &mut rng,
            Utc::now(),
        );

        assert_eq!(report.generated, 5);
        assert_eq!(report.persisted, 3);
        assert!(report.is_partial_failure());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(planner.workouts().len(), 5);
        assert_eq!(store.calls, 5);
    }

    #[test]
    fn test_lookup_and_completion() {
        let mut rng = StdRng::seed_from_u64(2);
        let workouts = generate(&beginner(), &build_default_catalog(), &mut rng, Utc::now());
        let first_id = workouts[0].id;
        let mut planner = WorkoutPlanner::from_workouts(workouts);

        assert!(matches!(
            planner.get(Uuid::new_v4()),
            Err(Error::WorkoutNotFound(_))
        ));
        assert_eq!(planner.next_workout().unwrap().id, first_id);

        planner.mark_completed(first_id).unwrap();
        assert!(planner.get(first_id).unwrap().completed);
        assert_ne!(planner.next_workout().unwrap().id, first_id);
    }
}
