//! Update Progress Use Case
//!
//! The accrual engine: module/challenge set updates, reward accrual into the
//! record AND the learner's lifetime totals, percentage recomputation, and
//! the once-only completion transition with rank recomputation.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::CourseId;
use uuid::Uuid;

use crate::domain::entities::CourseProgress;
use crate::domain::repository::{CourseRepository, LearnerStatsRepository, ProgressRepository};
use crate::error::{CourseError, CourseResult};

/// Update progress input
pub struct UpdateProgressInput {
    pub user_id: Uuid,
    pub course_id: CourseId,
    pub module_id: String,
    pub challenge_id: Option<String>,
}

/// Update progress use case
pub struct UpdateProgressUseCase<C, P, L>
where
    C: CourseRepository,
    P: ProgressRepository,
    L: LearnerStatsRepository,
{
    course_repo: Arc<C>,
    progress_repo: Arc<P>,
    stats_repo: Arc<L>,
}

impl<C, P, L> UpdateProgressUseCase<C, P, L>
where
    C: CourseRepository,
    P: ProgressRepository,
    L: LearnerStatsRepository,
{
    pub fn new(course_repo: Arc<C>, progress_repo: Arc<P>, stats_repo: Arc<L>) -> Self {
        Self {
            course_repo,
            progress_repo,
            stats_repo,
        }
    }

    pub async fn execute(&self, input: UpdateProgressInput) -> CourseResult<CourseProgress> {
        let now = Utc::now();

        let course = self
            .course_repo
            .find_by_id(&input.course_id)
            .await?
            .ok_or(CourseError::CourseNotFound)?;

        let mut progress = self
            .progress_repo
            .find(input.user_id, &input.course_id)
            .await?
            .ok_or(CourseError::CourseNotStarted)?;

        // Module set update; unknown ids are recorded verbatim
        progress.complete_module(&input.module_id);

        // Challenge accrual: both accumulators, exactly once per challenge.
        // A challenge id the course does not know is skipped silently - the
        // module update above still applies.
        let mut stats = None;
        if let Some(challenge_id) = &input.challenge_id {
            if !progress.has_completed_challenge(challenge_id) {
                if let Some(challenge) = course.find_challenge(challenge_id) {
                    progress.complete_challenge(challenge);

                    let mut s = self.stats_repo.find_or_default(input.user_id).await?;
                    s.award(challenge.xp_reward, challenge.key_reward, now);
                    stats = Some(s);
                } else {
                    tracing::debug!(
                        challenge_id = %challenge_id,
                        course_id = %input.course_id,
                        "Unknown challenge id ignored"
                    );
                }
            }
        }

        progress.recompute_percentage(course.total_items());

        if progress.finalize_if_complete(now) {
            let mut s = match stats.take() {
                Some(s) => s,
                None => self.stats_repo.find_or_default(input.user_id).await?,
            };
            s.record_completion(now);

            tracing::info!(
                user_id = %input.user_id,
                course_id = %input.course_id,
                courses_completed = s.courses_completed,
                rank = %s.rank,
                "Course completed"
            );

            stats = Some(s);
        }

        progress.touch(&input.module_id, now);

        // One transaction covers the progress record and, when mutated, the
        // lifetime stats
        self.progress_repo
            .save_with_stats(&progress, stats.as_ref())
            .await?;

        Ok(progress)
    }
}
