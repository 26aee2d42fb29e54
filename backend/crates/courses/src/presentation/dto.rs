//! API DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Challenge, Course, CourseModule, CourseProgress};

// ============================================================================
// Catalog
// ============================================================================

/// Query parameters for the catalog listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCoursesQuery {
    pub search: Option<String>,
    /// "General", "Red Teaming", "Blue Teaming"
    pub section: Option<String>,
    pub level: Option<i16>,
    /// "oldest" | "hardest" | "easiest" (default: newest)
    pub sort: Option<String>,
}

/// Course summary for the catalog listing (no module content)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummaryResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: i16,
    pub section: String,
    pub module_count: usize,
    pub challenge_count: usize,
    pub total_xp: u32,
    pub total_keys: u32,
    pub estimated_hours: u32,
}

impl From<&Course> for CourseSummaryResponse {
    fn from(course: &Course) -> Self {
        Self {
            id: course.course_id.to_string(),
            title: course.title.clone(),
            description: course.description.clone(),
            level: course.level,
            section: course.section.code().to_string(),
            module_count: course.modules.len(),
            challenge_count: course.challenges.len(),
            total_xp: course.total_xp,
            total_keys: course.total_keys,
            estimated_hours: course.estimated_hours,
        }
    }
}

/// Module representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResponse {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl From<&CourseModule> for ModuleResponse {
    fn from(module: &CourseModule) -> Self {
        Self {
            id: module.id.clone(),
            title: module.title.clone(),
            content: module.content.clone(),
        }
    }
}

/// Challenge representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub xp_reward: u32,
    pub key_reward: u32,
}

impl From<&Challenge> for ChallengeResponse {
    fn from(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id.clone(),
            title: challenge.title.clone(),
            description: challenge.description.clone(),
            xp_reward: challenge.xp_reward,
            key_reward: challenge.key_reward,
        }
    }
}

/// Full course detail
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub summary: CourseSummaryResponse,
    pub modules: Vec<ModuleResponse>,
    pub challenges: Vec<ChallengeResponse>,
}

impl From<&Course> for CourseDetailResponse {
    fn from(course: &Course) -> Self {
        Self {
            summary: CourseSummaryResponse::from(course),
            modules: course.modules.iter().map(ModuleResponse::from).collect(),
            challenges: course
                .challenges
                .iter()
                .map(ChallengeResponse::from)
                .collect(),
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Progress update request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub module_id: String,
    pub challenge_id: Option<String>,
}

/// Progress representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub course_id: String,
    pub completed_modules: Vec<String>,
    pub completed_challenges: Vec<String>,
    pub current_module: String,
    pub progress_percentage: i32,
    pub xp_earned: u32,
    pub keys_earned: u32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: DateTime<Utc>,
}

impl From<&CourseProgress> for ProgressResponse {
    fn from(progress: &CourseProgress) -> Self {
        Self {
            course_id: progress.course_id.to_string(),
            completed_modules: progress.completed_modules.clone(),
            completed_challenges: progress.completed_challenges.clone(),
            current_module: progress.current_module.clone(),
            progress_percentage: progress.progress_percentage,
            xp_earned: progress.xp_earned,
            keys_earned: progress.keys_earned,
            is_completed: progress.is_completed,
            completed_at: progress.completed_at,
            last_accessed_at: progress.last_accessed_at,
        }
    }
}

/// One entry in the user's course list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCourseResponse {
    pub course: CourseSummaryResponse,
    pub progress: ProgressResponse,
}

/// The user's courses, split by completion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCoursesResponse {
    pub in_progress: Vec<UserCourseResponse>,
    pub completed: Vec<UserCourseResponse>,
}
