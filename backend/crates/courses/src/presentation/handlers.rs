//! HTTP Handlers
//!
//! Catalog reads are public; everything touching progress sits behind the
//! auth middleware and reads the [`Principal`] from request extensions.

use axum::Extension;
use axum::Json;
use axum::extract::{Path, Query, State};
use kernel::id::CourseId;
use std::sync::Arc;
use uuid::Uuid;

use kernel::principal::Principal;
use subscription::SubscriptionGate;

use crate::application::{
    GetCourseUseCase, GetProgressUseCase, ListCoursesUseCase, RetakeCourseUseCase,
    StartCourseUseCase, UpdateProgressInput, UpdateProgressUseCase, UserCoursesUseCase,
};
use crate::domain::repository::{CourseRepository, LearnerStatsRepository, ProgressRepository};
use crate::domain::value_objects::{CourseFilters, Section, SortOrder};
use crate::error::{CourseError, CourseResult};
use crate::presentation::dto::{
    CourseDetailResponse, CourseSummaryResponse, ListCoursesQuery, ProgressResponse,
    UpdateProgressRequest, UserCourseResponse, UserCoursesResponse,
};

/// Bound shared by every course handler's repository
pub trait CourseRepo:
    CourseRepository
    + ProgressRepository
    + LearnerStatsRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> CourseRepo for T where
    T: CourseRepository
        + ProgressRepository
        + LearnerStatsRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Shared state for course handlers
#[derive(Clone)]
pub struct CourseAppState<R, G>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub gate: Arc<G>,
}

// ============================================================================
// Catalog (public)
// ============================================================================

/// GET /api/courses
pub async fn list_courses<R, G>(
    State(state): State<CourseAppState<R, G>>,
    Query(query): Query<ListCoursesQuery>,
) -> CourseResult<Json<Vec<CourseSummaryResponse>>>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    let filters = CourseFilters {
        search: query.search,
        section: query.section.as_deref().and_then(Section::from_code),
        level: query.level,
        sort: query
            .sort
            .as_deref()
            .map(SortOrder::from_code)
            .unwrap_or_default(),
    };

    let courses = ListCoursesUseCase::new(state.repo.clone())
        .execute(filters)
        .await?;

    Ok(Json(
        courses.iter().map(CourseSummaryResponse::from).collect(),
    ))
}

/// GET /api/courses/{course_id}
pub async fn get_course<R, G>(
    State(state): State<CourseAppState<R, G>>,
    Path(course_id): Path<Uuid>,
) -> CourseResult<Json<CourseDetailResponse>>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    let course = GetCourseUseCase::new(state.repo.clone())
        .execute(CourseId::from_uuid(course_id))
        .await?;

    Ok(Json(CourseDetailResponse::from(&course)))
}

// ============================================================================
// Progress (authenticated)
// ============================================================================

/// POST /api/courses/{course_id}/start
pub async fn start_course<R, G>(
    State(state): State<CourseAppState<R, G>>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<Uuid>,
) -> CourseResult<Json<ProgressResponse>>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    let progress =
        StartCourseUseCase::new(state.repo.clone(), state.repo.clone(), state.gate.clone())
            .execute(principal.user_id, CourseId::from_uuid(course_id))
            .await?;

    Ok(Json(ProgressResponse::from(&progress)))
}

/// PUT /api/courses/{course_id}/progress
pub async fn update_progress<R, G>(
    State(state): State<CourseAppState<R, G>>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<UpdateProgressRequest>,
) -> CourseResult<Json<ProgressResponse>>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    let progress = UpdateProgressUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
    )
    .execute(UpdateProgressInput {
        user_id: principal.user_id,
        course_id: CourseId::from_uuid(course_id),
        module_id: req.module_id,
        challenge_id: req.challenge_id,
    })
    .await?;

    Ok(Json(ProgressResponse::from(&progress)))
}

/// POST /api/courses/{course_id}/retake
pub async fn retake_course<R, G>(
    State(state): State<CourseAppState<R, G>>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<Uuid>,
) -> CourseResult<Json<ProgressResponse>>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    let progress =
        RetakeCourseUseCase::new(state.repo.clone(), state.repo.clone(), state.gate.clone())
            .execute(principal.user_id, CourseId::from_uuid(course_id))
            .await?;

    Ok(Json(ProgressResponse::from(&progress)))
}

/// GET /api/courses/{course_id}/progress
pub async fn get_progress<R, G>(
    State(state): State<CourseAppState<R, G>>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<Uuid>,
) -> CourseResult<Json<ProgressResponse>>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    let progress = GetProgressUseCase::new(state.repo.clone())
        .execute(principal.user_id, CourseId::from_uuid(course_id))
        .await?
        .ok_or(CourseError::CourseNotStarted)?;

    Ok(Json(ProgressResponse::from(&progress)))
}

/// GET /api/courses/mine
pub async fn user_courses<R, G>(
    State(state): State<CourseAppState<R, G>>,
    Extension(principal): Extension<Principal>,
) -> CourseResult<Json<UserCoursesResponse>>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    let result = UserCoursesUseCase::new(state.repo.clone(), state.repo.clone())
        .execute(principal.user_id)
        .await?;

    fn to_response(
        items: &[(crate::domain::entities::Course, crate::domain::entities::CourseProgress)],
    ) -> Vec<UserCourseResponse> {
        items
            .iter()
            .map(|(course, progress)| UserCourseResponse {
                course: CourseSummaryResponse::from(course),
                progress: ProgressResponse::from(progress),
            })
            .collect()
    }

    Ok(Json(UserCoursesResponse {
        in_progress: to_response(&result.in_progress),
        completed: to_response(&result.completed),
    }))
}

impl<R, G> CourseAppState<R, G>
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, gate: G) -> Self {
        Self {
            repo: Arc::new(repo),
            gate: Arc::new(gate),
        }
    }
}
