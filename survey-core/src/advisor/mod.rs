//! Advisory backend.
//!
//! The engine talks to an [`AdvisoryService`], which never fails: any
//! backend error is logged and replaced by [`fallback_reply`].

#[cfg(feature = "advisor-http")]
pub mod http;
pub mod prompt;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::QuestionContext;
use crate::error::{Error, Result};

#[cfg(feature = "advisor-http")]
pub use http::ChatCompletionAdvisor;

/// A language-model backend that answers consultation queries.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Display name used in the reply heading
    fn name(&self) -> &str;

    /// Answer a participant's query about a question
    async fn advise(&self, query: &str, context: &QuestionContext) -> Result<String>;

    /// Connectivity check; returns a short reply from the backend
    async fn ping(&self) -> Result<String>;
}

/// Backend used when no advisor URL is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAdvisor;

#[async_trait]
impl Advisor for DisabledAdvisor {
    fn name(&self) -> &str {
        "advisor"
    }

    async fn advise(&self, _query: &str, _context: &QuestionContext) -> Result<String> {
        Err(Error::Advisor("advisor is not configured".into()))
    }

    async fn ping(&self) -> Result<String> {
        Err(Error::Advisor("advisor is not configured".into()))
    }
}

/// Fail-open wrapper around an [`Advisor`].
#[derive(Clone)]
pub struct AdvisoryService {
    backend: Arc<dyn Advisor>,
}

impl AdvisoryService {
    pub fn new(backend: Arc<dyn Advisor>) -> Self {
        Self { backend }
    }

    /// Service whose every consultation uses the fallback text
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledAdvisor))
    }

    /// Build the service from configuration
    pub fn from_config(config: &crate::config::AdvisorConfig) -> Result<Self> {
        if !config.is_enabled() {
            return Ok(Self::disabled());
        }

        Ok(Self::new(http_backend(config)?))
    }

    pub fn backend(&self) -> &Arc<dyn Advisor> {
        &self.backend
    }

    /// Consult the backend; returns display-ready text in every case.
    pub async fn consult(&self, query: &str, context: &QuestionContext) -> String {
        match self.backend.advise(query, context).await {
            Ok(reply) if !reply.trim().is_empty() => {
                debug!(advisor = self.backend.name(), "advisor replied");
                format!("Consultation ({}):\n\n{}", self.backend.name(), reply.trim())
            }
            Ok(_) => {
                warn!(advisor = self.backend.name(), "advisor returned an empty reply, using fallback");
                fallback_reply(query)
            }
            Err(e) => {
                warn!(advisor = self.backend.name(), error = %e, "advisor failed, using fallback");
                fallback_reply(query)
            }
        }
    }
}

#[cfg(feature = "advisor-http")]
fn http_backend(config: &crate::config::AdvisorConfig) -> Result<Arc<dyn Advisor>> {
    Ok(Arc::new(ChatCompletionAdvisor::from_config(config)?))
}

#[cfg(not(feature = "advisor-http"))]
fn http_backend(_config: &crate::config::AdvisorConfig) -> Result<Arc<dyn Advisor>> {
    Err(Error::Config(
        "advisor.base_url is set but survey-core was built without advisor-http".into(),
    ))
}

/// Fixed text used when the backend cannot answer.
pub fn fallback_reply(query: &str) -> String {
    format!(
        "Consultation temporarily unavailable\n\n\
         The advisor could not be reached right now.\n\n\
         Your question: \"{}\"\n\n\
         General guidance:\n\
         • Weigh each product against your goals and your attitude to risk\n\
         • Compare real returns (nominal return minus inflation)\n\
         • Diversify between different kinds of assets\n\
         • Talk to a financial adviser before large decisions\n\n\
         Please try asking again later.",
        query.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAdvisor(Option<&'static str>);

    #[async_trait]
    impl Advisor for EchoAdvisor {
        fn name(&self) -> &str {
            "echo"
        }

        async fn advise(&self, _query: &str, _context: &QuestionContext) -> Result<String> {
            self.0
                .map(String::from)
                .ok_or_else(|| Error::Advisor("boom".into()))
        }

        async fn ping(&self) -> Result<String> {
            Ok("pong".into())
        }
    }

    #[tokio::test]
    async fn test_reply_gets_heading() {
        let service = AdvisoryService::new(Arc::new(EchoAdvisor(Some(" Pick A. "))));
        let reply = service.consult("which?", &QuestionContext::default()).await;
        assert_eq!(reply, "Consultation (echo):\n\nPick A.");
    }

    #[tokio::test]
    async fn test_failures_fall_back() {
        let failing = AdvisoryService::new(Arc::new(EchoAdvisor(None)));
        let reply = failing.consult("which is safer?", &QuestionContext::default()).await;
        assert_eq!(reply, fallback_reply("which is safer?"));
        assert!(reply.contains("\"which is safer?\""));

        let empty = AdvisoryService::new(Arc::new(EchoAdvisor(Some("   "))));
        let reply = empty.consult("q", &QuestionContext::default()).await;
        assert_eq!(reply, fallback_reply("q"));

        let disabled = AdvisoryService::disabled();
        assert_eq!(disabled.consult("q", &QuestionContext::default()).await, fallback_reply("q"));
        assert!(disabled.backend().ping().await.is_err());
    }

    #[test]
    fn test_from_config_disabled_without_url() {
        let service = AdvisoryService::from_config(&crate::config::AdvisorConfig::default()).unwrap();
        assert_eq!(service.backend().name(), "advisor");
    }
}
