#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod configuration_service;
pub mod error;
pub mod flow;
pub mod session_store;

pub use skillpath_core::Clock;

pub use api::{ApiConfig, AssessmentApi, GeneratedAssessment, HttpAssessmentApi, RoadmapRequest};
pub use app_services::AppServices;
pub use configuration_service::ConfigurationService;
pub use error::{
    ApiError, AppServicesError, ConfigurationServiceError, FlowError, SessionStoreError,
};
pub use flow::{
    FlowController, FlowSettings, FlowStage, Navigator, RecordingNavigator, RoadmapTarget, Route,
    SubmissionStatus, SubmissionTicket,
};
pub use session_store::SessionStore;
