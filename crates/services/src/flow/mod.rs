mod controller;
mod route;

pub use controller::{FlowController, FlowSettings, FlowStage, SubmissionStatus, SubmissionTicket};
pub use route::{Navigator, RecordingNavigator, RoadmapTarget, Route};
