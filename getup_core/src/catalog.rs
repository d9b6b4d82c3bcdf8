//! Default catalog of exercise definitions.
//!
//! Each entry pairs descriptive metadata with its rep-tracking parameters and
//! posture rule set. Adding an exercise means adding one definition here plus
//! one analyzer function in [`crate::posture`].

use crate::posture::{strength, yoga};
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

const ELBOW_FLEXION: PrimaryAngle = PrimaryAngle {
    endpoint_a: LimbJoint::Shoulder,
    vertex: LimbJoint::Elbow,
    endpoint_b: LimbJoint::Wrist,
};

const KNEE_FLEXION: PrimaryAngle = PrimaryAngle {
    endpoint_a: LimbJoint::Hip,
    vertex: LimbJoint::Knee,
    endpoint_b: LimbJoint::Ankle,
};

const SHOULDER_ABDUCTION: PrimaryAngle = PrimaryAngle {
    endpoint_a: LimbJoint::Hip,
    vertex: LimbJoint::Shoulder,
    endpoint_b: LimbJoint::Elbow,
};

/// Builds the default catalog with the built-in exercises
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalogs.
pub fn build_default_catalog() -> Catalog {
    let mut catalog = Catalog::default();

    // ========================================================================
    // Strength
    // ========================================================================

    catalog.insert(ExerciseDefinition {
        id: "bicep_curl",
        name: "Bicep Curl",
        description: "Stand tall, curl the dumbbell toward your shoulder, then lower under control.",
        muscle_groups: &["Biceps", "Forearms"],
        camera_setup: "Prop your phone sideways against a wall at hip height, your full arm visible.",
        category: ExerciseCategory::Strength,
        default_sets: 3,
        default_reps: 12,
        tracking: RepTracking::Motion {
            angle: ELBOW_FLEXION,
            thresholds: RepThresholds::new(150.0, 40.0),
        },
        analyze: strength::bicep_curl,
    });

    catalog.insert(ExerciseDefinition {
        id: "shoulder_press",
        name: "Shoulder Press",
        description: "Start with dumbbells at ear height, press overhead until arms are fully extended.",
        muscle_groups: &["Shoulders", "Triceps", "Upper Chest"],
        camera_setup: "Prop your phone in front of you at chest height, both arms fully visible.",
        category: ExerciseCategory::Strength,
        default_sets: 3,
        default_reps: 10,
        tracking: RepTracking::Motion {
            angle: ELBOW_FLEXION,
            thresholds: RepThresholds::new(100.0, 160.0),
        },
        analyze: strength::shoulder_press,
    });

    catalog.insert(ExerciseDefinition {
        id: "lateral_raise",
        name: "Lateral Raise",
        description: "Raise dumbbells out to the sides until arms are parallel to the floor.",
        muscle_groups: &["Side Delts"],
        camera_setup: "Prop your phone in front of you at chest height and stand 5-6 feet away.",
        category: ExerciseCategory::Strength,
        default_sets: 3,
        default_reps: 15,
        tracking: RepTracking::Motion {
            angle: SHOULDER_ABDUCTION,
            thresholds: RepThresholds::new(30.0, 80.0),
        },
        analyze: strength::lateral_raise,
    });

    catalog.insert(ExerciseDefinition {
        id: "squat",
        name: "Dumbbell Squat",
        description: "Hold dumbbells at your sides, squat until thighs are parallel to the floor.",
        muscle_groups: &["Quads", "Glutes", "Hamstrings"],
        camera_setup: "Prop your phone sideways at hip height, 6 feet away, head to ankle in frame.",
        category: ExerciseCategory::Strength,
        default_sets: 3,
        default_reps: 12,
        tracking: RepTracking::Motion {
            angle: KNEE_FLEXION,
            thresholds: RepThresholds::new(165.0, 100.0),
        },
        analyze: strength::squat,
    });

    catalog.insert(ExerciseDefinition {
        id: "tricep_extension",
        name: "Tricep Extension",
        description: "Hold one dumbbell overhead with both hands, lower behind head, then extend.",
        muscle_groups: &["Triceps"],
        camera_setup: "Prop your phone to your side at shoulder height, elbow to wrist visible.",
        category: ExerciseCategory::Strength,
        default_sets: 3,
        default_reps: 12,
        tracking: RepTracking::Motion {
            angle: ELBOW_FLEXION,
            thresholds: RepThresholds::new(70.0, 150.0),
        },
        analyze: strength::tricep_extension,
    });

    // ========================================================================
    // Yoga (reps are seconds held)
    // ========================================================================

    catalog.insert(ExerciseDefinition {
        id: "warrior_one",
        name: "Warrior I",
        description: "Step one foot back, bend front knee to 90°, raise arms overhead with palms together.",
        muscle_groups: &["Hip Flexors", "Quads", "Shoulders"],
        camera_setup: "Prop your phone to your side so your full body from head to feet is visible.",
        category: ExerciseCategory::Yoga,
        default_sets: 2,
        default_reps: 30,
        tracking: RepTracking::Hold,
        analyze: yoga::warrior_one,
    });

    catalog.insert(ExerciseDefinition {
        id: "warrior_two",
        name: "Warrior II",
        description: "Wide stance, bend front knee, extend arms parallel to floor and gaze over front hand.",
        muscle_groups: &["Quads", "Glutes", "Shoulders"],
        camera_setup: "Prop your phone in front of you so both arms and legs are fully visible.",
        category: ExerciseCategory::Yoga,
        default_sets: 2,
        default_reps: 30,
        tracking: RepTracking::Hold,
        analyze: yoga::warrior_two,
    });

    catalog.insert(ExerciseDefinition {
        id: "tree_pose",
        name: "Tree Pose",
        description: "Stand on one leg, place the other foot on your inner thigh, raise arms overhead.",
        muscle_groups: &["Balance", "Core", "Glutes"],
        camera_setup: "Prop your phone in front of you so your full body to the standing foot is visible.",
        category: ExerciseCategory::Yoga,
        default_sets: 2,
        default_reps: 30,
        tracking: RepTracking::Hold,
        analyze: yoga::tree_pose,
    });

    catalog.insert(ExerciseDefinition {
        id: "downward_dog",
        name: "Downward Dog",
        description: "Hands and feet on floor, hips raised high, forming an inverted V shape.",
        muscle_groups: &["Hamstrings", "Shoulders", "Calves", "Core"],
        camera_setup: "Prop your phone to your side at floor level so your full body is visible.",
        category: ExerciseCategory::Yoga,
        default_sets: 3,
        default_reps: 20,
        tracking: RepTracking::Hold,
        analyze: yoga::downward_dog,
    });

    catalog.insert(ExerciseDefinition {
        id: "chair_pose",
        name: "Chair Pose",
        description: "Feet together, bend knees as if sitting in a chair, raise arms overhead.",
        muscle_groups: &["Quads", "Glutes", "Core", "Shoulders"],
        camera_setup: "Prop your phone to your side so your full body from head to feet is visible.",
        category: ExerciseCategory::Yoga,
        default_sets: 3,
        default_reps: 30,
        tracking: RepTracking::Hold,
        analyze: yoga::chair_pose,
    });

    catalog
}

impl Catalog {
    fn insert(&mut self, definition: ExerciseDefinition) {
        self.exercises.insert(definition.id, definition);
    }

    /// Add an exercise, rejecting duplicate ids and invalid definitions
    pub fn register(&mut self, definition: ExerciseDefinition) -> Result<()> {
        if self.exercises.contains_key(definition.id) {
            return Err(Error::CatalogValidation(format!(
                "Exercise '{}' is already registered",
                definition.id
            )));
        }
        let errors = validate_definition(&definition);
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        self.insert(definition);
        Ok(())
    }

    /// Look up an exercise by id
    pub fn get(&self, id: &str) -> Result<&ExerciseDefinition> {
        self.exercises
            .get(id)
            .ok_or_else(|| Error::UnknownExercise(id.to_string()))
    }

    /// All exercises in a category, sorted by id for stable listings
    pub fn by_category(&self, category: ExerciseCategory) -> Vec<&ExerciseDefinition> {
        let mut found: Vec<_> = self
            .exercises
            .values()
            .filter(|d| d.category == category)
            .collect();
        found.sort_by_key(|d| d.id);
        found
    }

    /// All exercises sorted by category then id
    pub fn sorted(&self) -> Vec<&ExerciseDefinition> {
        let mut all: Vec<_> = self.exercises.values().collect();
        all.sort_by_key(|d| (d.category != ExerciseCategory::Strength, d.id));
        all
    }

    /// Validate every definition
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, definition) in &self.exercises {
            if *key != definition.id {
                errors.push(format!(
                    "Exercise registered as '{}' has id '{}'",
                    key, definition.id
                ));
            }
            errors.extend(validate_definition(definition));
        }

        errors
    }
}

fn validate_definition(definition: &ExerciseDefinition) -> Vec<String> {
    let mut errors = Vec::new();
    let id = definition.id;

    if id.is_empty() {
        errors.push("Exercise has an empty id".to_string());
    }
    if definition.name.is_empty() {
        errors.push(format!("Exercise '{}': empty name", id));
    }
    if definition.default_sets == 0 {
        errors.push(format!("Exercise '{}': default sets must be at least 1", id));
    }
    if definition.default_reps == 0 {
        errors.push(format!("Exercise '{}': default reps must be at least 1", id));
    }

    if let Some(thresholds) = definition.thresholds() {
        if let Err(e) = crate::rep_counter::validate_thresholds(&thresholds) {
            errors.push(format!("Exercise '{}': {}", id, e));
        }
    }

    errors
}
