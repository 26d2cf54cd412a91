#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod persistence;
pub mod profile_service;
pub mod tracker_service;

pub use tracker_core::Clock;

pub use app_services::AppServices;
pub use dashboard::{Dashboard, LinkTargets, SubjectSummary, TaskItem};
pub use error::{AppServicesError, ProfileServiceError, TrackerServiceError};
pub use persistence::{Persister, load_state};
pub use profile_service::ProfileService;
pub use tracker_service::TrackerService;
