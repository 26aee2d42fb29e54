//! Retake Course Use Case
//!
//! Resets an existing progress record in place; with no record it behaves
//! exactly like starting the course. Lifetime totals are never rolled back.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::CourseId;
use uuid::Uuid;

use subscription::SubscriptionGate;

use crate::application::start_course::StartCourseUseCase;
use crate::domain::entities::CourseProgress;
use crate::domain::repository::{CourseRepository, ProgressRepository};
use crate::error::CourseResult;

/// Retake course use case
pub struct RetakeCourseUseCase<C, P, G>
where
    C: CourseRepository,
    P: ProgressRepository,
    G: SubscriptionGate,
{
    course_repo: Arc<C>,
    progress_repo: Arc<P>,
    gate: Arc<G>,
}

impl<C, P, G> RetakeCourseUseCase<C, P, G>
where
    C: CourseRepository,
    P: ProgressRepository,
    G: SubscriptionGate,
{
    pub fn new(course_repo: Arc<C>, progress_repo: Arc<P>, gate: Arc<G>) -> Self {
        Self {
            course_repo,
            progress_repo,
            gate,
        }
    }

    pub async fn execute(&self, user_id: Uuid, course_id: CourseId) -> CourseResult<CourseProgress> {
        if let Some(mut progress) = self.progress_repo.find(user_id, &course_id).await? {
            progress.reset_for_retake(Utc::now());
            self.progress_repo.update(&progress).await?;

            tracing::info!(
                user_id = %user_id,
                course_id = %course_id,
                "Course retake started"
            );
            return Ok(progress);
        }

        // No record yet: same path as a first start, gate included
        StartCourseUseCase::new(
            self.course_repo.clone(),
            self.progress_repo.clone(),
            self.gate.clone(),
        )
        .execute(user_id, course_id)
        .await
    }
}
