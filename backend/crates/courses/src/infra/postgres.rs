//! PostgreSQL Repository Implementations
//!
//! Catalog rows live in `courses` with ordered child tables for modules and
//! challenges. Progress is one row per (user, course) with the completed-id
//! sets as text arrays. The challenge-award dual write (progress row +
//! learner_stats row) runs inside a single transaction.

use chrono::{DateTime, Utc};
use kernel::id::CourseId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Challenge, Course, CourseModule, CourseProgress, LearnerStats};
use crate::domain::repository::{CourseRepository, LearnerStatsRepository, ProgressRepository};
use crate::domain::value_objects::{CourseFilters, Rank, Section, SortOrder};
use crate::error::{CourseError, CourseResult};

/// PostgreSQL-backed course repository
#[derive(Clone)]
pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_children(&self, course_id: Uuid) -> CourseResult<(Vec<CourseModule>, Vec<Challenge>)> {
        let modules = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT module_id, title, content
            FROM course_modules
            WHERE course_id = $1
            ORDER BY position
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ModuleRow::into_module)
        .collect();

        let challenges = sqlx::query_as::<_, ChallengeRow>(
            r#"
            SELECT challenge_id, title, description, xp_reward, key_reward
            FROM course_challenges
            WHERE course_id = $1
            ORDER BY position
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ChallengeRow::into_challenge)
        .collect();

        Ok((modules, challenges))
    }
}

// ============================================================================
// Course Repository Implementation
// ============================================================================

const COURSE_COLUMNS: &str = r#"
    course_id,
    title,
    description,
    level,
    section,
    total_xp,
    total_keys,
    estimated_hours,
    is_active,
    created_at,
    updated_at
"#;

impl CourseRepository for PgCourseRepository {
    async fn find_by_id(&self, course_id: &CourseId) -> CourseResult<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = $1 AND is_active"
        ))
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (modules, challenges) = self.load_children(row.course_id).await?;
        Ok(Some(row.into_course(modules, challenges)?))
    }

    async fn list(&self, filters: &CourseFilters) -> CourseResult<Vec<Course>> {
        let order_by = match filters.sort {
            SortOrder::Newest => "created_at DESC",
            SortOrder::Oldest => "created_at ASC",
            SortOrder::Hardest => "level DESC",
            SortOrder::Easiest => "level ASC",
        };

        let rows = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            SELECT {COURSE_COLUMNS} FROM courses
            WHERE is_active
              AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::smallint IS NULL OR section = $2)
              AND ($3::smallint IS NULL OR level = $3)
            ORDER BY {order_by}
            "#
        ))
        .bind(&filters.search)
        .bind(filters.section.map(|s| s.id()))
        .bind(filters.level)
        .fetch_all(&self.pool)
        .await?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            let (modules, challenges) = self.load_children(row.course_id).await?;
            courses.push(row.into_course(modules, challenges)?);
        }

        Ok(courses)
    }
}

// ============================================================================
// Progress Repository Implementation
// ============================================================================

const PROGRESS_COLUMNS: &str = r#"
    user_id,
    course_id,
    completed_modules,
    completed_challenges,
    current_module,
    progress_percentage,
    xp_earned,
    keys_earned,
    is_completed,
    completed_at,
    last_accessed_at,
    created_at,
    updated_at
"#;

impl ProgressRepository for PgCourseRepository {
    async fn create(&self, progress: &CourseProgress) -> CourseResult<bool> {
        // The (user_id, course_id) unique constraint turns a concurrent
        // duplicate start into a benign no-op
        let inserted = sqlx::query(
            r#"
            INSERT INTO course_progress (
                user_id,
                course_id,
                completed_modules,
                completed_challenges,
                current_module,
                progress_percentage,
                xp_earned,
                keys_earned,
                is_completed,
                completed_at,
                last_accessed_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(progress.user_id)
        .bind(progress.course_id.as_uuid())
        .bind(&progress.completed_modules)
        .bind(&progress.completed_challenges)
        .bind(&progress.current_module)
        .bind(progress.progress_percentage)
        .bind(progress.xp_earned as i64)
        .bind(progress.keys_earned as i64)
        .bind(progress.is_completed)
        .bind(progress.completed_at)
        .bind(progress.last_accessed_at)
        .bind(progress.created_at)
        .bind(progress.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn find(
        &self,
        user_id: Uuid,
        course_id: &CourseId,
    ) -> CourseResult<Option<CourseProgress>> {
        let row = sqlx::query_as::<_, ProgressRow>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM course_progress WHERE user_id = $1 AND course_id = $2"
        ))
        .bind(user_id)
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProgressRow::into_progress))
    }

    async fn update(&self, progress: &CourseProgress) -> CourseResult<()> {
        update_progress_query(progress)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_with_stats(
        &self,
        progress: &CourseProgress,
        stats: Option<&LearnerStats>,
    ) -> CourseResult<()> {
        let mut tx = self.pool.begin().await?;

        update_progress_query(progress).execute(&mut *tx).await?;

        if let Some(stats) = stats {
            upsert_stats_query(stats).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> CourseResult<Vec<CourseProgress>> {
        let rows = sqlx::query_as::<_, ProgressRow>(&format!(
            r#"
            SELECT {PROGRESS_COLUMNS} FROM course_progress
            WHERE user_id = $1
            ORDER BY last_accessed_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProgressRow::into_progress).collect())
    }
}

fn update_progress_query(
    progress: &CourseProgress,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        UPDATE course_progress SET
            completed_modules = $3,
            completed_challenges = $4,
            current_module = $5,
            progress_percentage = $6,
            xp_earned = $7,
            keys_earned = $8,
            is_completed = $9,
            completed_at = $10,
            last_accessed_at = $11,
            updated_at = $12
        WHERE user_id = $1 AND course_id = $2
        "#,
    )
    .bind(progress.user_id)
    .bind(progress.course_id.as_uuid())
    .bind(&progress.completed_modules)
    .bind(&progress.completed_challenges)
    .bind(&progress.current_module)
    .bind(progress.progress_percentage)
    .bind(progress.xp_earned as i64)
    .bind(progress.keys_earned as i64)
    .bind(progress.is_completed)
    .bind(progress.completed_at)
    .bind(progress.last_accessed_at)
    .bind(progress.updated_at)
}

fn upsert_stats_query(
    stats: &LearnerStats,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO learner_stats (
            user_id,
            total_xp,
            total_keys,
            courses_completed,
            rank,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO UPDATE SET
            total_xp = EXCLUDED.total_xp,
            total_keys = EXCLUDED.total_keys,
            courses_completed = EXCLUDED.courses_completed,
            rank = EXCLUDED.rank,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(stats.user_id)
    .bind(stats.total_xp as i64)
    .bind(stats.total_keys as i64)
    .bind(stats.courses_completed)
    .bind(stats.rank.id())
    .bind(stats.created_at)
    .bind(stats.updated_at)
}

// ============================================================================
// Learner Stats Repository Implementation
// ============================================================================

impl LearnerStatsRepository for PgCourseRepository {
    async fn find_or_default(&self, user_id: Uuid) -> CourseResult<LearnerStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT user_id, total_xp, total_keys, courses_completed, rank, created_at, updated_at
            FROM learner_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_stats(),
            None => Ok(LearnerStats::new(user_id, Utc::now())),
        }
    }

    async fn upsert(&self, stats: &LearnerStats) -> CourseResult<()> {
        upsert_stats_query(stats).execute(&self.pool).await?;
        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct CourseRow {
    course_id: Uuid,
    title: String,
    description: String,
    level: i16,
    section: i16,
    total_xp: i32,
    total_keys: i32,
    estimated_hours: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_course(
        self,
        modules: Vec<CourseModule>,
        challenges: Vec<Challenge>,
    ) -> CourseResult<Course> {
        let section = Section::from_id(self.section)
            .ok_or_else(|| CourseError::Internal(format!("Invalid section id: {}", self.section)))?;

        Ok(Course {
            course_id: CourseId::from_uuid(self.course_id),
            title: self.title,
            description: self.description,
            level: self.level,
            section,
            modules,
            challenges,
            total_xp: self.total_xp.max(0) as u32,
            total_keys: self.total_keys.max(0) as u32,
            estimated_hours: self.estimated_hours.max(0) as u32,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ModuleRow {
    module_id: String,
    title: String,
    content: String,
}

impl ModuleRow {
    fn into_module(self) -> CourseModule {
        CourseModule {
            id: self.module_id,
            title: self.title,
            content: self.content,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChallengeRow {
    challenge_id: String,
    title: String,
    description: String,
    xp_reward: i32,
    key_reward: i32,
}

impl ChallengeRow {
    fn into_challenge(self) -> Challenge {
        Challenge {
            id: self.challenge_id,
            title: self.title,
            description: self.description,
            xp_reward: self.xp_reward.max(0) as u32,
            key_reward: self.key_reward.max(0) as u32,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    user_id: Uuid,
    course_id: Uuid,
    completed_modules: Vec<String>,
    completed_challenges: Vec<String>,
    current_module: String,
    progress_percentage: i32,
    xp_earned: i64,
    keys_earned: i64,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    last_accessed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProgressRow {
    fn into_progress(self) -> CourseProgress {
        CourseProgress {
            user_id: self.user_id,
            course_id: CourseId::from_uuid(self.course_id),
            completed_modules: self.completed_modules,
            completed_challenges: self.completed_challenges,
            current_module: self.current_module,
            progress_percentage: self.progress_percentage,
            xp_earned: self.xp_earned.max(0) as u32,
            keys_earned: self.keys_earned.max(0) as u32,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
            last_accessed_at: self.last_accessed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    user_id: Uuid,
    total_xp: i64,
    total_keys: i64,
    courses_completed: i32,
    rank: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StatsRow {
    fn into_stats(self) -> CourseResult<LearnerStats> {
        let rank = Rank::from_id(self.rank)
            .ok_or_else(|| CourseError::Internal(format!("Invalid rank id: {}", self.rank)))?;

        Ok(LearnerStats {
            user_id: self.user_id,
            total_xp: self.total_xp.max(0) as u64,
            total_keys: self.total_keys.max(0) as u64,
            courses_completed: self.courses_completed,
            rank,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
