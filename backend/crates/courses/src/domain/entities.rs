//! Domain Entities
//!
//! Core business entities for the courses domain: the read-only catalog
//! (Course with its modules and challenges), the per-(user, course) progress
//! record, and the learner's lifetime stats.
//!
//! Accrual transitions are pure methods taking an explicit `now`; the
//! application layer persists afterwards.

use chrono::{DateTime, Utc};
use kernel::id::CourseId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Rank, Section};

// ============================================================================
// Catalog (read-only to the accrual engine)
// ============================================================================

/// One unit of course content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseModule {
    /// Stable identifier, unique within the course
    pub id: String,
    pub title: String,
    pub content: String,
}

/// A scored exercise with fixed rewards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Stable identifier, unique within the course
    pub id: String,
    pub title: String,
    pub description: String,
    pub xp_reward: u32,
    pub key_reward: u32,
}

/// Course entity - an ordered sequence of modules and challenges
#[derive(Debug, Clone)]
pub struct Course {
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    /// Difficulty tier; also drives catalog totals (level * 100 XP)
    pub level: i16,
    pub section: Section,
    pub modules: Vec<CourseModule>,
    pub challenges: Vec<Challenge>,
    pub total_xp: u32,
    pub total_keys: u32,
    pub estimated_hours: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// First module id, or empty when the course has no modules yet
    pub fn first_module_id(&self) -> String {
        self.modules
            .first()
            .map(|m| m.id.clone())
            .unwrap_or_default()
    }

    /// Look up a challenge by its stable id
    pub fn find_challenge(&self, challenge_id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == challenge_id)
    }

    /// Completable items (modules + challenges), the percentage denominator
    pub fn total_items(&self) -> usize {
        self.modules.len() + self.challenges.len()
    }
}

// ============================================================================
// CourseProgress
// ============================================================================

/// Per-(user, course) progress record, unique on that pair.
///
/// Completed ids are sets: re-adding an existing id is a no-op. The record
/// is created on course start, mutated on every update, and reset (never
/// deleted) on retake.
#[derive(Debug, Clone)]
pub struct CourseProgress {
    pub user_id: Uuid,
    pub course_id: CourseId,
    pub completed_modules: Vec<String>,
    pub completed_challenges: Vec<String>,
    pub current_module: String,
    /// round(100 * completed / total); no clamping, the completion check is
    /// an exact == 100
    pub progress_percentage: i32,
    pub xp_earned: u32,
    pub keys_earned: u32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseProgress {
    /// Create the record for a freshly started course
    pub fn start(user_id: Uuid, course: &Course, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id: course.course_id,
            completed_modules: Vec::new(),
            completed_challenges: Vec::new(),
            current_module: course.first_module_id(),
            progress_percentage: 0,
            xp_earned: 0,
            keys_earned: 0,
            is_completed: false,
            completed_at: None,
            last_accessed_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a module as completed (set semantics).
    ///
    /// The id is NOT checked against the course's module list; an unknown id
    /// is recorded verbatim. Returns true when newly added.
    pub fn complete_module(&mut self, module_id: &str) -> bool {
        if self.completed_modules.iter().any(|m| m == module_id) {
            return false;
        }
        self.completed_modules.push(module_id.to_string());
        true
    }

    /// Whether a challenge id is already in the completed set
    pub fn has_completed_challenge(&self, challenge_id: &str) -> bool {
        self.completed_challenges.iter().any(|c| c == challenge_id)
    }

    /// Record a challenge as completed and accrue its rewards into this
    /// record. Returns true when newly added (the caller mirrors the award
    /// into the learner's lifetime totals).
    pub fn complete_challenge(&mut self, challenge: &Challenge) -> bool {
        if self.has_completed_challenge(&challenge.id) {
            return false;
        }
        self.completed_challenges.push(challenge.id.clone());
        self.xp_earned += challenge.xp_reward;
        self.keys_earned += challenge.key_reward;
        true
    }

    /// Recompute the percentage from the set sizes; 0 when the course has no
    /// completable items.
    pub fn recompute_percentage(&mut self, total_items: usize) {
        let completed = self.completed_modules.len() + self.completed_challenges.len();
        self.progress_percentage = if total_items == 0 {
            0
        } else {
            ((completed as f64 / total_items as f64) * 100.0).round() as i32
        };
    }

    /// Fire the completion transition if the record just reached exactly
    /// 100%. At most once per completion cycle: a repeated 100% update
    /// returns false.
    pub fn finalize_if_complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.progress_percentage == 100 && !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(now);
            return true;
        }
        false
    }

    /// Update the cursor: `current_module` moves even when the module was
    /// already completed.
    pub fn touch(&mut self, module_id: &str, now: DateTime<Utc>) {
        self.current_module = module_id.to_string();
        self.last_accessed_at = now;
        self.updated_at = now;
    }

    /// Reset for a retake. Record-local counters only; lifetime totals
    /// already awarded stay with the learner.
    pub fn reset_for_retake(&mut self, now: DateTime<Utc>) {
        self.completed_modules.clear();
        self.completed_challenges.clear();
        self.progress_percentage = 0;
        self.xp_earned = 0;
        self.keys_earned = 0;
        self.is_completed = false;
        self.completed_at = None;
        self.last_accessed_at = now;
        self.updated_at = now;
    }
}

// ============================================================================
// LearnerStats
// ============================================================================

/// Lifetime accumulators for a learner, created lazily with defaults.
///
/// Cumulative only: nothing here is ever rolled back, including on retake.
#[derive(Debug, Clone)]
pub struct LearnerStats {
    pub user_id: Uuid,
    pub total_xp: u64,
    pub total_keys: u64,
    pub courses_completed: i32,
    pub rank: Rank,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearnerStats {
    /// Fresh stats row for a learner with no history
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            total_xp: 0,
            total_keys: 0,
            courses_completed: 0,
            rank: Rank::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Accrue challenge rewards into the lifetime totals
    pub fn award(&mut self, xp: u32, keys: u32, now: DateTime<Utc>) {
        self.total_xp += xp as u64;
        self.total_keys += keys as u64;
        self.updated_at = now;
    }

    /// Count a course completion and recompute the rank. Below the lowest
    /// threshold the current rank is left as-is.
    pub fn record_completion(&mut self, now: DateTime<Utc>) {
        self.courses_completed += 1;
        if let Some(rank) = Rank::for_completed(self.courses_completed) {
            self.rank = rank;
        }
        self.updated_at = now;
    }
}
