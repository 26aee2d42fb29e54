//! Start Course Use Case
//!
//! Gate check, then create-or-return the progress record (idempotent).

use std::sync::Arc;

use chrono::Utc;
use kernel::id::CourseId;
use uuid::Uuid;

use subscription::SubscriptionGate;

use crate::domain::entities::CourseProgress;
use crate::domain::repository::{CourseRepository, ProgressRepository};
use crate::error::{CourseError, CourseResult};

/// Start course use case
pub struct StartCourseUseCase<C, P, G>
where
    C: CourseRepository,
    P: ProgressRepository,
    G: SubscriptionGate,
{
    course_repo: Arc<C>,
    progress_repo: Arc<P>,
    gate: Arc<G>,
}

impl<C, P, G> StartCourseUseCase<C, P, G>
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
        if !self.gate.has_access(user_id).await? {
            return Err(CourseError::SubscriptionRequired);
        }

        let course = self
            .course_repo
            .find_by_id(&course_id)
            .await?
            .ok_or(CourseError::CourseNotFound)?;

        // Idempotent: an existing record is returned unchanged
        if let Some(existing) = self.progress_repo.find(user_id, &course_id).await? {
            return Ok(existing);
        }

        let progress = CourseProgress::start(user_id, &course, Utc::now());

        if self.progress_repo.create(&progress).await? {
            tracing::info!(
                user_id = %user_id,
                course_id = %course_id,
                "Course started"
            );
            return Ok(progress);
        }

        // Lost the race to a concurrent start; the winner's record is the
        // canonical one
        self.progress_repo
            .find(user_id, &course_id)
            .await?
            .ok_or_else(|| {
                CourseError::Internal("Progress vanished after duplicate insert".to_string())
            })
    }
}
