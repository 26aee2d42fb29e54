//! Unit tests for the courses crate
//!
//! The accrual engine is exercised end to end against in-memory
//! repositories and a stub subscription gate; entity-level tests live next
//! to the entities.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use kernel::id::CourseId;
use uuid::Uuid;

use subscription::error::SubscriptionResult;
use subscription::SubscriptionGate;

use crate::application::{
    RetakeCourseUseCase, StartCourseUseCase, UpdateProgressInput, UpdateProgressUseCase,
};
use crate::domain::entities::{Challenge, Course, CourseModule, CourseProgress, LearnerStats};
use crate::domain::repository::{CourseRepository, LearnerStatsRepository, ProgressRepository};
use crate::domain::value_objects::{CourseFilters, Rank, Section};
use crate::error::{CourseError, CourseResult};

// ============================================================================
// In-memory repositories
// ============================================================================

#[derive(Default)]
struct MemCourseStore {
    courses: Mutex<Vec<Course>>,
    progress: Mutex<Vec<CourseProgress>>,
    stats: Mutex<HashMap<Uuid, LearnerStats>>,
}

impl MemCourseStore {
    fn add_course(&self, course: Course) -> CourseId {
        let id = course.course_id;
        self.courses.lock().unwrap().push(course);
        id
    }

    fn stats_of(&self, user_id: Uuid) -> Option<LearnerStats> {
        self.stats.lock().unwrap().get(&user_id).cloned()
    }
}

impl CourseRepository for MemCourseStore {
    async fn find_by_id(&self, course_id: &CourseId) -> CourseResult<Option<Course>> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.course_id == *course_id && c.is_active)
            .cloned())
    }

    async fn list(&self, filters: &CourseFilters) -> CourseResult<Vec<Course>> {
        let courses = self.courses.lock().unwrap();
        Ok(courses
            .iter()
            .filter(|c| c.is_active)
            .filter(|c| {
                filters
                    .search
                    .as_ref()
                    .is_none_or(|s| c.title.to_lowercase().contains(&s.to_lowercase()))
            })
            .filter(|c| filters.section.is_none_or(|s| c.section == s))
            .filter(|c| filters.level.is_none_or(|l| c.level == l))
            .cloned()
            .collect())
    }
}

impl ProgressRepository for MemCourseStore {
    async fn create(&self, progress: &CourseProgress) -> CourseResult<bool> {
        let mut all = self.progress.lock().unwrap();
        if all
            .iter()
            .any(|p| p.user_id == progress.user_id && p.course_id == progress.course_id)
        {
            return Ok(false);
        }
        all.push(progress.clone());
        Ok(true)
    }

    async fn find(
        &self,
        user_id: Uuid,
        course_id: &CourseId,
    ) -> CourseResult<Option<CourseProgress>> {
        Ok(self
            .progress
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id && p.course_id == *course_id)
            .cloned())
    }

    async fn update(&self, progress: &CourseProgress) -> CourseResult<()> {
        let mut all = self.progress.lock().unwrap();
        if let Some(existing) = all
            .iter_mut()
            .find(|p| p.user_id == progress.user_id && p.course_id == progress.course_id)
        {
            *existing = progress.clone();
        }
        Ok(())
    }

    async fn save_with_stats(
        &self,
        progress: &CourseProgress,
        stats: Option<&LearnerStats>,
    ) -> CourseResult<()> {
        self.update(progress).await?;
        if let Some(stats) = stats {
            self.upsert(stats).await?;
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> CourseResult<Vec<CourseProgress>> {
        Ok(self
            .progress
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl LearnerStatsRepository for MemCourseStore {
    async fn find_or_default(&self, user_id: Uuid) -> CourseResult<LearnerStats> {
        Ok(self
            .stats
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| LearnerStats::new(user_id, Utc::now())))
    }

    async fn upsert(&self, stats: &LearnerStats) -> CourseResult<()> {
        self.stats
            .lock()
            .unwrap()
            .insert(stats.user_id, stats.clone());
        Ok(())
    }
}

/// Stub gate; flips between allow-all and deny-all
#[derive(Default)]
struct StubGate {
    deny: AtomicBool,
}

impl SubscriptionGate for StubGate {
    async fn has_access(&self, _user_id: Uuid) -> SubscriptionResult<bool> {
        Ok(!self.deny.load(Ordering::Relaxed))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn course(modules: &[&str], challenges: &[(&str, u32, u32)]) -> Course {
    let now = Utc::now();
    Course {
        course_id: CourseId::new(),
        title: "Red Teaming I".to_string(),
        description: "Offense basics".to_string(),
        level: 2,
        section: Section::RedTeaming,
        modules: modules
            .iter()
            .map(|id| CourseModule {
                id: (*id).to_string(),
                title: format!("Module {id}"),
                content: String::new(),
            })
            .collect(),
        challenges: challenges
            .iter()
            .map(|(id, xp, keys)| Challenge {
                id: (*id).to_string(),
                title: format!("Challenge {id}"),
                description: String::new(),
                xp_reward: *xp,
                key_reward: *keys,
            })
            .collect(),
        total_xp: 200,
        total_keys: 2,
        estimated_hours: 3,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

struct Fixture {
    store: Arc<MemCourseStore>,
    gate: Arc<StubGate>,
    user_id: Uuid,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: Arc::new(MemCourseStore::default()),
            gate: Arc::new(StubGate::default()),
            user_id: Uuid::new_v4(),
        }
    }

    async fn start(&self, course_id: CourseId) -> CourseResult<CourseProgress> {
        StartCourseUseCase::new(self.store.clone(), self.store.clone(), self.gate.clone())
            .execute(self.user_id, course_id)
            .await
    }

    async fn update(
        &self,
        course_id: CourseId,
        module_id: &str,
        challenge_id: Option<&str>,
    ) -> CourseResult<CourseProgress> {
        UpdateProgressUseCase::new(self.store.clone(), self.store.clone(), self.store.clone())
            .execute(UpdateProgressInput {
                user_id: self.user_id,
                course_id,
                module_id: module_id.to_string(),
                challenge_id: challenge_id.map(str::to_string),
            })
            .await
    }

    async fn retake(&self, course_id: CourseId) -> CourseResult<CourseProgress> {
        RetakeCourseUseCase::new(self.store.clone(), self.store.clone(), self.gate.clone())
            .execute(self.user_id, course_id)
            .await
    }

    /// Run a course with one module and no challenges to completion
    async fn complete_trivial_course(&self) {
        let course_id = self.store.add_course(course(&["only"], &[]));
        self.start(course_id).await.unwrap();
        let progress = self.update(course_id, "only", None).await.unwrap();
        assert!(progress.is_completed);
    }
}

// ============================================================================
// Start course
// ============================================================================

mod start_course_tests {
    use super::*;

    #[tokio::test]
    async fn test_start_requires_subscription() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1"], &[]));
        fx.gate.deny.store(true, Ordering::Relaxed);

        let result = fx.start(course_id).await;
        assert!(matches!(result, Err(CourseError::SubscriptionRequired)));
    }

    #[tokio::test]
    async fn test_start_unknown_course() {
        let fx = Fixture::new();
        let result = fx.start(CourseId::new()).await;
        assert!(matches!(result, Err(CourseError::CourseNotFound)));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1", "m2"], &[]));

        let first = fx.start(course_id).await.unwrap();
        assert_eq!(first.current_module, "m1");

        // Progress made between the two start calls survives
        fx.update(course_id, "m1", None).await.unwrap();
        let second = fx.start(course_id).await.unwrap();
        assert_eq!(second.completed_modules, vec!["m1".to_string()]);
        assert_eq!(second.created_at, first.created_at);
    }
}

// ============================================================================
// Update progress (the accrual engine)
// ============================================================================

mod update_progress_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_before_start() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1"], &[]));

        let result = fx.update(course_id, "m1", None).await;
        assert!(matches!(result, Err(CourseError::CourseNotStarted)));
    }

    #[tokio::test]
    async fn test_two_modules_one_challenge_scenario() {
        let fx = Fixture::new();
        let course_id = fx
            .store
            .add_course(course(&["m1", "m2"], &[("ch1", 50, 1)]));
        fx.start(course_id).await.unwrap();

        let p1 = fx.update(course_id, "m1", None).await.unwrap();
        assert_eq!(p1.progress_percentage, 33);
        assert!(!p1.is_completed);

        let p2 = fx.update(course_id, "m2", None).await.unwrap();
        assert_eq!(p2.progress_percentage, 67);

        let p3 = fx.update(course_id, "m2", Some("ch1")).await.unwrap();
        assert_eq!(p3.progress_percentage, 100);
        assert!(p3.is_completed);
        assert!(p3.completed_at.is_some());
        assert_eq!(p3.xp_earned, 50);
        assert_eq!(p3.keys_earned, 1);

        let stats = fx.store.stats_of(fx.user_id).unwrap();
        assert_eq!(stats.total_xp, 50);
        assert_eq!(stats.total_keys, 1);
        assert_eq!(stats.courses_completed, 1);
    }

    #[tokio::test]
    async fn test_duplicate_challenge_awards_once() {
        let fx = Fixture::new();
        let course_id = fx
            .store
            .add_course(course(&["m1", "m2"], &[("ch1", 50, 1)]));
        fx.start(course_id).await.unwrap();

        fx.update(course_id, "m1", Some("ch1")).await.unwrap();
        let progress = fx.update(course_id, "m1", Some("ch1")).await.unwrap();

        assert_eq!(progress.xp_earned, 50);
        assert_eq!(progress.keys_earned, 1);
        assert_eq!(progress.completed_challenges.len(), 1);

        let stats = fx.store.stats_of(fx.user_id).unwrap();
        assert_eq!(stats.total_xp, 50);
        assert_eq!(stats.total_keys, 1);
    }

    #[tokio::test]
    async fn test_unknown_challenge_skipped_module_still_applies() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1", "m2"], &[]));
        fx.start(course_id).await.unwrap();

        let progress = fx.update(course_id, "m1", Some("ghost")).await.unwrap();

        assert_eq!(progress.completed_modules, vec!["m1".to_string()]);
        assert!(progress.completed_challenges.is_empty());
        assert_eq!(progress.xp_earned, 0);
        // No stats row was ever written
        assert!(fx.store.stats_of(fx.user_id).is_none());
    }

    #[tokio::test]
    async fn test_unknown_module_recorded_verbatim() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1", "m2"], &[]));
        fx.start(course_id).await.unwrap();

        let progress = fx.update(course_id, "not-a-module", None).await.unwrap();

        assert_eq!(progress.completed_modules, vec!["not-a-module".to_string()]);
        assert_eq!(progress.progress_percentage, 50); // 1 of 2 items
        assert_eq!(progress.current_module, "not-a-module");
    }

    #[tokio::test]
    async fn test_completion_counted_once_on_repeated_full_updates() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1"], &[]));
        fx.start(course_id).await.unwrap();

        let progress = fx.update(course_id, "m1", None).await.unwrap();
        assert!(progress.is_completed);
        let completed_at = progress.completed_at;

        // Another update at 100%: cursor moves, completion does not re-fire
        let progress = fx.update(course_id, "m1", None).await.unwrap();
        assert!(progress.is_completed);
        assert_eq!(progress.completed_at, completed_at);

        let stats = fx.store.stats_of(fx.user_id).unwrap();
        assert_eq!(stats.courses_completed, 1);
    }

    #[tokio::test]
    async fn test_percentage_monotonic_across_calls() {
        let fx = Fixture::new();
        let course_id = fx
            .store
            .add_course(course(&["m1", "m2", "m3"], &[("ch1", 10, 0)]));
        fx.start(course_id).await.unwrap();

        let mut last = 0;
        for (module, challenge) in [
            ("m1", None),
            ("m1", None),
            ("m2", Some("ch1")),
            ("m1", Some("ch1")),
            ("m3", None),
        ] {
            let progress = fx.update(course_id, module, challenge).await.unwrap();
            assert!(progress.progress_percentage >= last);
            last = progress.progress_percentage;
        }
        assert_eq!(last, 100);
    }

    #[tokio::test]
    async fn test_rank_recomputed_from_completions() {
        let fx = Fixture::new();

        for expected_rank in [
            Rank::Beginner, // 1
            Rank::Beginner, // 2
            Rank::Beginner, // 3 - first threshold
            Rank::Beginner, // 4
            Rank::Beginner, // 5
            Rank::Novice,   // 6
        ] {
            fx.complete_trivial_course().await;
            let stats = fx.store.stats_of(fx.user_id).unwrap();
            assert_eq!(stats.rank, expected_rank);
        }

        let stats = fx.store.stats_of(fx.user_id).unwrap();
        assert_eq!(stats.courses_completed, 6);
    }
}

// ============================================================================
// Retake
// ============================================================================

mod retake_tests {
    use super::*;

    #[tokio::test]
    async fn test_retake_zeroes_record_but_not_lifetime_stats() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1"], &[("ch1", 50, 1)]));
        fx.start(course_id).await.unwrap();

        fx.update(course_id, "m1", Some("ch1")).await.unwrap();
        let stats_before = fx.store.stats_of(fx.user_id).unwrap();
        assert_eq!(stats_before.total_xp, 50);
        assert_eq!(stats_before.courses_completed, 1);

        let progress = fx.retake(course_id).await.unwrap();
        assert!(progress.completed_modules.is_empty());
        assert!(progress.completed_challenges.is_empty());
        assert_eq!(progress.progress_percentage, 0);
        assert_eq!(progress.xp_earned, 0);
        assert_eq!(progress.keys_earned, 0);
        assert!(!progress.is_completed);

        // Lifetime totals are untouched by the retake itself
        let stats_after = fx.store.stats_of(fx.user_id).unwrap();
        assert_eq!(stats_after.total_xp, 50);
        assert_eq!(stats_after.total_keys, 1);
        assert_eq!(stats_after.courses_completed, 1);
    }

    #[tokio::test]
    async fn test_completing_again_after_retake_accrues_again() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1"], &[("ch1", 50, 1)]));
        fx.start(course_id).await.unwrap();

        fx.update(course_id, "m1", Some("ch1")).await.unwrap();
        fx.retake(course_id).await.unwrap();
        fx.update(course_id, "m1", Some("ch1")).await.unwrap();

        // Cumulative: the second run adds on top of the first
        let stats = fx.store.stats_of(fx.user_id).unwrap();
        assert_eq!(stats.total_xp, 100);
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.courses_completed, 2);
    }

    #[tokio::test]
    async fn test_retake_without_record_behaves_as_start() {
        let fx = Fixture::new();
        let course_id = fx.store.add_course(course(&["m1", "m2"], &[]));

        let progress = fx.retake(course_id).await.unwrap();
        assert_eq!(progress.current_module, "m1");
        assert_eq!(progress.progress_percentage, 0);

        // And the gate still applies on that path
        let fx2 = Fixture::new();
        let course_id2 = fx2.store.add_course(course(&["m1"], &[]));
        fx2.gate.deny.store(true, Ordering::Relaxed);
        let result = fx2.retake(course_id2).await;
        assert!(matches!(result, Err(CourseError::SubscriptionRequired)));
    }
}
