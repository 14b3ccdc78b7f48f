//! # Tasktally
//!
//! A to-do core with recurring tasks and completion analytics, plus the
//! `tasktally` command line front end built on it.
//!
//! ## Pieces
//!
//! *   [`repository::TaskRepository`]: the owned task collection. Create, update,
//!     toggle, delete, archive and restore, with filtered snapshot listings.
//! *   [`recurrence::expand`]: turns a [`recurrence::RecurrenceSpec`] into a
//!     bounded run of daily, weekly or monthly occurrences that the repository
//!     appends in one atomic batch.
//! *   [`summary::SummaryEngine`]: daily and weekly buckets, per-category
//!     breakdowns and today/week/overall completion rates.
//! *   [`storage::Store`]: JSON files backing the CLI between runs.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use tasktally::clock::FixedClock;
//! use tasktally::models::SchedulePattern;
//! use tasktally::recurrence::RecurrenceSpec;
//! use tasktally::repository::TaskRepository;
//! use tasktally::summary::SummaryEngine;
//!
//! let now = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let mut repo = TaskRepository::new(Arc::new(FixedClock::new(now)));
//!
//! let spec = RecurrenceSpec::new("Standup", "work", SchedulePattern::Daily).max_occurrences(5);
//! let created = repo.create_recurring(&spec, now).unwrap();
//! assert_eq!(created.len(), 5);
//!
//! let stats = SummaryEngine::new(now).overall_stats(repo.tasks());
//! assert_eq!(stats.today.due, 1);
//! ```

pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod recurrence;
pub mod repository;
pub mod storage;
pub mod summary;

pub use error::{Error, Result};
