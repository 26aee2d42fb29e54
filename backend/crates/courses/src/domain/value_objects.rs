//! Domain Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Rank
// ============================================================================

/// Learner rank, derived solely from the lifetime completed-course count.
///
/// Every account starts at Beginner. Below 3 completions no threshold
/// matches, so a recomputation leaves the current rank in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Rank {
    #[default]
    Beginner = 0,
    Novice = 1,
    Intermediate = 2,
    Advanced = 3,
    Expert = 4,
}

impl Rank {
    /// Highest rank whose threshold the completion count satisfies.
    /// Returns None below the lowest threshold (rank left unchanged).
    pub fn for_completed(courses_completed: i32) -> Option<Self> {
        match courses_completed {
            n if n >= 15 => Some(Rank::Expert),
            n if n >= 12 => Some(Rank::Advanced),
            n if n >= 9 => Some(Rank::Intermediate),
            n if n >= 6 => Some(Rank::Novice),
            n if n >= 3 => Some(Rank::Beginner),
            _ => None,
        }
    }

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Rank::Beginner => "beginner",
            Rank::Novice => "novice",
            Rank::Intermediate => "intermediate",
            Rank::Advanced => "advanced",
            Rank::Expert => "expert",
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Rank::Beginner),
            1 => Some(Rank::Novice),
            2 => Some(Rank::Intermediate),
            3 => Some(Rank::Advanced),
            4 => Some(Rank::Expert),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Section
// ============================================================================

/// Course catalog section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum Section {
    General = 0,
    RedTeaming = 1,
    BlueTeaming = 2,
}

impl Section {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Display form used in the API and the catalog UI
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Section::General => "General",
            Section::RedTeaming => "Red Teaming",
            Section::BlueTeaming => "Blue Teaming",
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Section::General),
            1 => Some(Section::RedTeaming),
            2 => Some(Section::BlueTeaming),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "General" => Some(Section::General),
            "Red Teaming" => Some(Section::RedTeaming),
            "Blue Teaming" => Some(Section::BlueTeaming),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Catalog filters
// ============================================================================

/// Catalog sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first (default)
    #[default]
    Newest,
    Oldest,
    /// Highest level first
    Hardest,
    /// Lowest level first
    Easiest,
}

impl SortOrder {
    pub fn from_code(code: &str) -> Self {
        match code {
            "oldest" => SortOrder::Oldest,
            "hardest" => SortOrder::Hardest,
            "easiest" => SortOrder::Easiest,
            _ => SortOrder::Newest,
        }
    }
}

/// Catalog listing filters
#[derive(Debug, Clone, Default)]
pub struct CourseFilters {
    /// Case-insensitive title substring
    pub search: Option<String>,
    pub section: Option<Section>,
    pub level: Option<i16>,
    pub sort: SortOrder,
}
