use std::sync::Arc;

use tracing::{debug, info};

use skillpath_core::model::{AssessmentConfiguration, ConfigurationBuilder};

use crate::api::{AssessmentApi, GeneratedAssessment};
use crate::error::ConfigurationServiceError;

/// Drives the remote side of the configuration step.
#[derive(Clone)]
pub struct ConfigurationService {
    api: Arc<dyn AssessmentApi>,
}

impl ConfigurationService {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>) -> Self {
        Self { api }
    }

    /// Fetch topic suggestions for the builder's prompt and apply them.
    ///
    /// The builder is in its loading state for the duration of the call.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationServiceError::EmptyPrompt` for a blank prompt, or
    /// `ConfigurationServiceError::Api` if the request fails.
    pub async fn suggest_topics(
        &self,
        builder: &mut ConfigurationBuilder,
    ) -> Result<(), ConfigurationServiceError> {
        if builder.prompt().is_empty() {
            return Err(ConfigurationServiceError::EmptyPrompt);
        }

        builder.begin_loading();
        match self.api.generate_topics(builder.prompt()).await {
            Ok(topics) => {
                debug!(count = topics.len(), "topic suggestions received");
                builder.apply_suggestions(topics);
                Ok(())
            }
            Err(err) => {
                builder.loading_failed();
                Err(err.into())
            }
        }
    }

    /// Validate the builder and request a generated assessment.
    ///
    /// Invalid configurations never reach the remote service. On failure the builder
    /// is untouched and can be edited and submitted again.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationServiceError::Configuration` for local validation
    /// failures or `ConfigurationServiceError::Api` if generation fails.
    pub async fn submit(
        &self,
        builder: &ConfigurationBuilder,
    ) -> Result<(AssessmentConfiguration, GeneratedAssessment), ConfigurationServiceError> {
        let configuration = builder.build()?;
        let generated = self.api.generate_assessment(&configuration).await?;
        info!(
            assessment = %generated.assessment_id,
            questions = generated.questions.len(),
            "assessment generated"
        );
        Ok((configuration, generated))
    }
}
