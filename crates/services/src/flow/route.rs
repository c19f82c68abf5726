use std::sync::Mutex;

use url::form_urlencoded;

use skillpath_core::model::{AssessmentId, PersonalizationId};

/// Where the roadmap page should build from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoadmapTarget {
    Assessed {
        assessment_id: AssessmentId,
        personalization_id: PersonalizationId,
    },
    /// The assessment was skipped.
    Unassessed,
}

/// The externally observable transitions of the assessment flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Configuration,
    Assessment { assessment_id: AssessmentId },
    Roadmap(RoadmapTarget),
}

impl Route {
    /// Path plus query string, e.g. `/assessment?assessmentId=a1`.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::Configuration => "/personalize".to_owned(),
            Route::Assessment { assessment_id } => {
                with_query("/assessment", &[("assessmentId", assessment_id.as_str())])
            }
            Route::Roadmap(RoadmapTarget::Assessed {
                assessment_id,
                personalization_id,
            }) => with_query(
                "/roadmap",
                &[
                    ("assessmentId", assessment_id.as_str()),
                    ("personalizationId", personalization_id.as_str()),
                ],
            ),
            Route::Roadmap(RoadmapTarget::Unassessed) => {
                with_query("/roadmap", &[("skipAssessment", "true")])
            }
        }
    }
}

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

/// Receives the flow's navigation transitions.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Navigator that keeps every route it was sent, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .map(|routes| routes.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.routes().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_carry_identifiers_as_query_parameters() {
        assert_eq!(Route::Configuration.path(), "/personalize");
        assert_eq!(
            Route::Assessment {
                assessment_id: AssessmentId::new("a 1&b")
            }
            .path(),
            "/assessment?assessmentId=a+1%26b"
        );
        assert_eq!(
            Route::Roadmap(RoadmapTarget::Assessed {
                assessment_id: AssessmentId::new("a1"),
                personalization_id: PersonalizationId::new("p1"),
            })
            .path(),
            "/roadmap?assessmentId=a1&personalizationId=p1"
        );
        assert_eq!(
            Route::Roadmap(RoadmapTarget::Unassessed).path(),
            "/roadmap?skipAssessment=true"
        );
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let nav = RecordingNavigator::new();
        nav.navigate(&Route::Configuration);
        nav.navigate(&Route::Roadmap(RoadmapTarget::Unassessed));
        assert_eq!(nav.routes().len(), 2);
        assert_eq!(nav.last(), Some(Route::Roadmap(RoadmapTarget::Unassessed)));
    }
}
