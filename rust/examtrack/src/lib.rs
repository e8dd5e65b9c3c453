//! Exam-score analytics: normalizes flat exam rows into per-student
//! records and answers ranking, trend, alert, difficulty and report queries
//! over that in-memory model.

pub mod calc;
pub mod config;
pub mod difficulty;
pub mod ipc;
pub mod model;
pub mod rank;
pub mod reports;
pub mod trend;

pub use calc::{CumulativeStats, EngineError, SubjectStanding};
pub use config::AnalyticsConfig;
pub use model::{build_model, rows_from_payload, ExamEntry, ExamRecord, Model, Student, Subject};
pub use rank::{ExamFilter, RankCell};
