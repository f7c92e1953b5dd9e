mod helpers;
mod location_api;
pub mod pipeline;
mod route_api;
mod session_api;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    api::API, config::DEFAULT_SESSION_TTL_SECS, entities::Session, external::RoutingService,
    table::AddressTable,
};

type SessionStore = Mutex<HashMap<Uuid, Arc<Mutex<Session>>>>;

pub struct Engine {
    table: Arc<AddressTable>,
    routing: Arc<dyn RoutingService + Send + Sync>,
    profile: String,
    sessions: SessionStore,
    session_ttl: Duration,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all, fields(records = table.records().len()))]
    pub fn new(
        table: AddressTable,
        routing: Arc<dyn RoutingService + Send + Sync>,
        profile: String,
    ) -> Self {
        Self {
            table: Arc::new(table),
            routing,
            profile,
            sessions: Mutex::new(HashMap::new()),
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS.into()),
        }
    }

    /// Sessions not updated for longer than `session_ttl` are evicted.
    pub fn with_session_ttl(self, session_ttl: Duration) -> Self {
        Self {
            session_ttl,
            ..self
        }
    }
}

impl API for Engine {}

#[cfg(test)]
pub(crate) mod stub {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::{
        error::{directions_error, optimization_error, Error},
        external::{
            DirectionsRequest, DirectionsResponse, OptimizationRequest, OptimizationResponse,
            RoutingService,
        },
    };

    /// Answers with canned JSON; `None` answers with a 500 failure.
    #[derive(Default)]
    pub struct StubRouting {
        pub optimization: Option<serde_json::Value>,
        pub directions: Option<serde_json::Value>,
        pub optimize_calls: Mutex<Vec<OptimizationRequest>>,
        pub directions_calls: Mutex<Vec<DirectionsRequest>>,
    }

    #[async_trait]
    impl RoutingService for StubRouting {
        async fn optimize(
            &self,
            request: OptimizationRequest,
        ) -> Result<OptimizationResponse, Error> {
            self.optimize_calls.lock().unwrap().push(request);

            match &self.optimization {
                Some(body) => serde_json::from_value(body.clone())
                    .map_err(|e| optimization_error(format!("malformed response: {}", e))),
                None => Err(optimization_error(500)),
            }
        }

        async fn directions(&self, request: DirectionsRequest) -> Result<DirectionsResponse, Error> {
            self.directions_calls.lock().unwrap().push(request);

            match &self.directions {
                Some(body) => serde_json::from_value(body.clone())
                    .map_err(|e| directions_error(format!("malformed response: {}", e))),
                None => Err(directions_error(500)),
            }
        }
    }
}
