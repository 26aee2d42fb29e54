//! Catalog Use Cases
//!
//! Read-side operations: listing/fetching courses and reading a user's
//! progress across courses.

use std::sync::Arc;

use kernel::id::CourseId;
use uuid::Uuid;

use crate::domain::entities::{Course, CourseProgress};
use crate::domain::repository::{CourseRepository, ProgressRepository};
use crate::domain::value_objects::CourseFilters;
use crate::error::{CourseError, CourseResult};

/// List courses use case
pub struct ListCoursesUseCase<C>
where
    C: CourseRepository,
{
    course_repo: Arc<C>,
}

impl<C> ListCoursesUseCase<C>
where
    C: CourseRepository,
{
    pub fn new(course_repo: Arc<C>) -> Self {
        Self { course_repo }
    }

    pub async fn execute(&self, filters: CourseFilters) -> CourseResult<Vec<Course>> {
        self.course_repo.list(&filters).await
    }
}

/// Get course use case
pub struct GetCourseUseCase<C>
where
    C: CourseRepository,
{
    course_repo: Arc<C>,
}

impl<C> GetCourseUseCase<C>
where
    C: CourseRepository,
{
    pub fn new(course_repo: Arc<C>) -> Self {
        Self { course_repo }
    }

    pub async fn execute(&self, course_id: CourseId) -> CourseResult<Course> {
        self.course_repo
            .find_by_id(&course_id)
            .await?
            .ok_or(CourseError::CourseNotFound)
    }
}

/// Get progress use case
pub struct GetProgressUseCase<P>
where
    P: ProgressRepository,
{
    progress_repo: Arc<P>,
}

impl<P> GetProgressUseCase<P>
where
    P: ProgressRepository,
{
    pub fn new(progress_repo: Arc<P>) -> Self {
        Self { progress_repo }
    }

    pub async fn execute(
        &self,
        user_id: Uuid,
        course_id: CourseId,
    ) -> CourseResult<Option<CourseProgress>> {
        self.progress_repo.find(user_id, &course_id).await
    }
}

/// A user's courses, split by completion
pub struct UserCourses {
    pub in_progress: Vec<(Course, CourseProgress)>,
    pub completed: Vec<(Course, CourseProgress)>,
}

/// User courses use case
pub struct UserCoursesUseCase<C, P>
where
    C: CourseRepository,
    P: ProgressRepository,
{
    course_repo: Arc<C>,
    progress_repo: Arc<P>,
}

impl<C, P> UserCoursesUseCase<C, P>
where
    C: CourseRepository,
    P: ProgressRepository,
{
    pub fn new(course_repo: Arc<C>, progress_repo: Arc<P>) -> Self {
        Self {
            course_repo,
            progress_repo,
        }
    }

    pub async fn execute(&self, user_id: Uuid) -> CourseResult<UserCourses> {
        let progresses = self.progress_repo.list_for_user(user_id).await?;

        let mut in_progress = Vec::new();
        let mut completed = Vec::new();

        for progress in progresses {
            // A course may have been deactivated since the user started it
            let Some(course) = self.course_repo.find_by_id(&progress.course_id).await? else {
                continue;
            };

            if progress.is_completed {
                completed.push((course, progress));
            } else {
                in_progress.push((course, progress));
            }
        }

        Ok(UserCourses {
            in_progress,
            completed,
        })
    }
}
