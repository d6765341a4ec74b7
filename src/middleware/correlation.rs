//! Correlation-ID propagation.
//!
//! An incoming identifier always wins over generating a new one, so a chain
//! of services shares one id per logical request.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::CorrelationConfig;
use crate::handler::{BoxedHandler, boxed};
use crate::middleware::Filter;
use crate::request::Request;

type Generator = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct CorrelationId {
    config: Arc<CorrelationConfig>,
    generate: Generator,
}

impl CorrelationId {
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            config: Arc::new(config),
            generate: Arc::new(|| Uuid::new_v4().to_string()),
        }
    }

    /// Replaces the default random-UUID generator.
    pub fn with_generator(mut self, generate: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.generate = Arc::new(generate);
        self
    }

    fn resolve(&self, req: &Request) -> String {
        self.config
            .request_headers
            .iter()
            .find_map(|name| req.header(name))
            .map(str::to_owned)
            .unwrap_or_else(|| (self.generate)())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationId").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Filter for CorrelationId {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let this = self.clone();
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            let id = this.resolve(&req);
            let header = this.config.response_header.clone();
            async move {
                let res = next.call(req.with_correlation_id(id.clone())).await?;
                Ok::<_, crate::Error>(res.with_header(&header, id))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    fn echo() -> BoxedHandler {
        boxed(|req: Request| async move {
            Response::text(req.correlation_id().unwrap_or("none").to_owned())
        })
    }

    #[tokio::test]
    async fn propagates_incoming_id() {
        let h = CorrelationId::default().wrap(echo());
        let req = Request::builder().header("X-Correlation-ID", "abc-123").build();
        let res = h.call(req).await.unwrap();
        assert_eq!(res.body_text(), "abc-123");
        assert_eq!(res.header("X-Correlation-ID"), Some("abc-123"));
    }

    #[tokio::test]
    async fn falls_back_through_header_list() {
        let h = CorrelationId::default().wrap(echo());
        let req = Request::builder()
            .header("X-Trace-ID", "trace-9")
            .header("X-Request-ID", "req-7")
            .build();
        let res = h.call(req).await.unwrap();
        assert_eq!(res.body_text(), "req-7");
    }

    #[tokio::test]
    async fn generates_when_absent() {
        let h = CorrelationId::default().with_generator(|| "fixed".to_owned()).wrap(echo());
        let res = h.call(Request::builder().build()).await.unwrap();
        assert_eq!(res.body_text(), "fixed");
        assert_eq!(res.header("x-correlation-id"), Some("fixed"));
    }

    #[tokio::test]
    async fn default_generator_is_a_uuid() {
        let h = CorrelationId::default().wrap(echo());
        let res = h.call(Request::builder().build()).await.unwrap();
        assert!(Uuid::parse_str(res.body_text()).is_ok());
    }

    #[tokio::test]
    async fn custom_response_header() {
        let config = CorrelationConfig {
            response_header: "X-Request-ID".into(),
            ..CorrelationConfig::default()
        };
        let h = CorrelationId::new(config).wrap(echo());
        let res = h.call(Request::builder().header("X-Correlation-ID", "c1").build()).await.unwrap();
        assert_eq!(res.header("X-Request-ID"), Some("c1"));
        assert_eq!(res.header("X-Correlation-ID"), None);
    }
}
