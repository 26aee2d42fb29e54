//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//! The subscription gate consulted by `start_course` is
//! [`subscription::SubscriptionGate`], not redeclared here.

use kernel::id::CourseId;
use uuid::Uuid;

use crate::domain::entities::{Course, CourseProgress, LearnerStats};
use crate::domain::value_objects::CourseFilters;
use crate::error::CourseResult;

/// Course catalog repository trait (read-only to the accrual engine)
#[trait_variant::make(CourseRepository: Send)]
pub trait LocalCourseRepository {
    /// Find an active course by ID, with its modules and challenges
    async fn find_by_id(&self, course_id: &CourseId) -> CourseResult<Option<Course>>;

    /// List active courses matching the filters
    async fn list(&self, filters: &CourseFilters) -> CourseResult<Vec<Course>>;
}

/// Progress repository trait
#[trait_variant::make(ProgressRepository: Send)]
pub trait LocalProgressRepository {
    /// Insert a fresh progress record. Returns false when the
    /// (user, course) row already exists (uniqueness violation mapped to a
    /// benign no-op) - the caller re-fetches.
    async fn create(&self, progress: &CourseProgress) -> CourseResult<bool>;

    /// Find the progress record for a (user, course) pair
    async fn find(
        &self,
        user_id: Uuid,
        course_id: &CourseId,
    ) -> CourseResult<Option<CourseProgress>>;

    /// Update a progress record
    async fn update(&self, progress: &CourseProgress) -> CourseResult<()>;

    /// Persist progress and (optionally) learner stats together. Implemented
    /// as a single database transaction so a challenge award can never apply
    /// to one accumulator and not the other.
    async fn save_with_stats(
        &self,
        progress: &CourseProgress,
        stats: Option<&LearnerStats>,
    ) -> CourseResult<()>;

    /// All progress records for a user
    async fn list_for_user(&self, user_id: Uuid) -> CourseResult<Vec<CourseProgress>>;
}

/// Learner lifetime stats repository trait
#[trait_variant::make(LearnerStatsRepository: Send)]
pub trait LocalLearnerStatsRepository {
    /// Load the learner's stats, or a default row if none exists yet
    async fn find_or_default(&self, user_id: Uuid) -> CourseResult<LearnerStats>;

    /// Insert or update the stats row
    async fn upsert(&self, stats: &LearnerStats) -> CourseResult<()>;
}
