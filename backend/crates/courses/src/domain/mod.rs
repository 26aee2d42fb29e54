//! Domain Layer

pub mod entities;
pub mod repository;
pub mod value_objects;

// Re-exports
pub use entities::{Challenge, Course, CourseModule, CourseProgress, LearnerStats};
pub use repository::{CourseRepository, LearnerStatsRepository, ProgressRepository};
pub use value_objects::{CourseFilters, Rank, Section, SortOrder};
