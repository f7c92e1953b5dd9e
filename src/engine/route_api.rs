use super::pipeline::{self, OptimizedOrder};
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RouteAPI,
    entities::{RouteResult, Session, Stop},
    error::Error,
};

impl Engine {
    #[tracing::instrument(skip_all, fields(stops = stops.len()))]
    async fn optimize(&self, stops: &[Stop]) -> Result<OptimizedOrder, Error> {
        let request = pipeline::optimization_request(stops, &self.profile)?;
        let response = self.routing.optimize(request).await?;

        pipeline::order_stops(stops, &response)
    }

    #[tracing::instrument(skip_all, fields(stops = order.stops.len()))]
    async fn directions(&self, order: &OptimizedOrder) -> Result<RouteResult, Error> {
        let request = order.directions_request()?;
        let response = self.routing.directions(request).await?;

        pipeline::build_route(&self.table, order, response)
    }
}

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn add_address(&self, token: Uuid, query: String) -> Result<Session, Error> {
        let session = self.fetch_session(&token).await?;
        let mut session = session.lock().await;

        let matches = self.table.matching_addresses(&query);
        if matches.is_empty() {
            tracing::info!("no address matches {:?}", query);
            return Ok(session.clone());
        }

        let added = session.select(matches);
        tracing::info!("added {} addresses to route", added);

        Ok(session.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn clear_route(&self, token: Uuid) -> Result<Session, Error> {
        let session = self.fetch_session(&token).await?;
        let mut session = session.lock().await;

        session.clear();

        Ok(session.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn generate_route(&self, token: Uuid) -> Result<Session, Error> {
        let session = self.fetch_session(&token).await?;
        let mut session = session.lock().await;

        if !session.can_route() {
            tracing::info!("session has no addresses to route, returning early...");
            return Ok(session.clone());
        }

        let stops = pipeline::resolve_stops(&self.table, &session.selection)?;

        let order = self.optimize(&stops).await.map_err(|err| {
            tracing::warn!("optimization failed: {}", err.message);
            err
        })?;

        let route = self.directions(&order).await.map_err(|err| {
            tracing::warn!("directions failed: {}", err.message);
            err
        })?;

        tracing::info!(
            "generated route with {} stops and {} legs",
            route.stops.len(),
            route.legs.len()
        );
        session.complete(route);

        Ok(session.clone())
    }
}

#[cfg(test)]
fn routed_engine(stub: std::sync::Arc<super::stub::StubRouting>) -> Engine {
    use crate::table::{AddressTable, SAMPLE_CSV};

    Engine::new(
        AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap(),
        stub,
        "driving-car".into(),
    )
}

#[cfg(test)]
fn reordering_stub() -> super::stub::StubRouting {
    use serde_json::json;

    super::stub::StubRouting {
        optimization: Some(json!({
            "routes": [{ "steps": [
                { "type": "start" },
                { "type": "job", "id": 2 },
                { "type": "job", "id": 1 },
                { "type": "end" }
            ]}]
        })),
        directions: Some(json!({
            "features": [{
                "geometry": { "coordinates": [[-72.25, 46.5], [-72.5, 46.0], [-73.0, 45.0]] },
                "properties": { "segments": [
                    { "steps": [
                        { "instruction": "Turn left", "name": "Elm St", "distance": 450.0 },
                        { "instruction": "Arrive at destination", "name": "-", "distance": 0.0 }
                    ]}
                ]}
            }]
        })),
        ..Default::default()
    }
}

#[test]
fn add_address_deduplicates_matches() {
    use crate::api::SessionAPI;
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = routed_engine(Arc::new(reordering_stub()));
    let token = block_on(engine.create_session()).unwrap().token;

    let session = block_on(engine.add_address(token, "main".into())).unwrap();
    assert_eq!(session.selection, vec!["123 Main St", "789 Main Street"]);

    let session = block_on(engine.add_address(token, "123".into())).unwrap();
    assert_eq!(session.selection, vec!["123 Main St", "789 Main Street"]);

    let session = block_on(engine.add_address(token, "".into())).unwrap();
    assert_eq!(session.selection.len(), 2);

    let session = block_on(engine.add_address(token, "nowhere".into())).unwrap();
    assert_eq!(session.selection.len(), 2);
}

#[test]
fn generate_route_orders_stops_and_formats_instructions() {
    use crate::api::SessionAPI;
    use crate::entities::{Coordinates, SessionStatus};
    use std::sync::Arc;
    use tokio_test::block_on;

    let stub = Arc::new(reordering_stub());
    let engine = routed_engine(stub.clone());
    let token = block_on(engine.create_session()).unwrap().token;

    block_on(engine.add_address(token, "123 Main".into())).unwrap();
    block_on(engine.add_address(token, "456 Oak".into())).unwrap();

    let session = block_on(engine.generate_route(token)).unwrap();
    let route = session.route().unwrap();

    assert_eq!(
        route.stops,
        vec![Coordinates::new(46.5, -72.25), Coordinates::new(45.0, -73.0)]
    );
    assert_eq!(route.path[0], [46.5, -72.25]);
    assert_eq!(
        route.instructions(),
        vec![
            "To 123 Main St:",
            "- Turn left onto Elm St (450m)",
            "- Arrive at destination (0m)",
        ]
    );
    assert_eq!(session.status.name(), "routed");
    assert!(matches!(session.status, SessionStatus::Routed { .. }));

    let optimize_calls = stub.optimize_calls.lock().unwrap();
    assert_eq!(optimize_calls[0].jobs.len(), 2);
    assert_eq!(optimize_calls[0].vehicles[0].start, [-73.0, 45.0]);

    let directions_calls = stub.directions_calls.lock().unwrap();
    assert_eq!(
        directions_calls[0].coordinates,
        vec![[-72.25, 46.5], [-73.0, 45.0]]
    );
}

#[test]
fn optimization_failure_preserves_session() {
    use crate::api::SessionAPI;
    use std::sync::Arc;
    use tokio_test::block_on;

    let stub = Arc::new(super::stub::StubRouting::default());
    let engine = routed_engine(stub.clone());
    let token = block_on(engine.create_session()).unwrap().token;

    block_on(engine.add_address(token, "Main".into())).unwrap();
    let before = block_on(engine.find_session(token)).unwrap();

    let err = block_on(engine.generate_route(token)).unwrap_err();
    assert_eq!(err.code, 200);

    let after = block_on(engine.find_session(token)).unwrap();
    assert_eq!(after.selection, before.selection);
    assert_eq!(after.status, before.status);
    assert!(stub.directions_calls.lock().unwrap().is_empty());
}

#[test]
fn directions_failure_keeps_previous_route() {
    use crate::api::SessionAPI;
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = routed_engine(Arc::new(reordering_stub()));
    let token = block_on(engine.create_session()).unwrap().token;
    block_on(engine.add_address(token, "123 Main".into())).unwrap();
    block_on(engine.add_address(token, "456 Oak".into())).unwrap();
    let routed = block_on(engine.generate_route(token)).unwrap();

    // swap in a failing directions service with the same session store
    let failing = Arc::new(super::stub::StubRouting {
        directions: None,
        ..reordering_stub()
    });
    let engine = Engine {
        routing: failing,
        ..engine
    };

    let err = block_on(engine.generate_route(token)).unwrap_err();
    assert_eq!(err.code, 201);

    let after = block_on(engine.find_session(token)).unwrap();
    assert_eq!(after.status, routed.status);
}

#[test]
fn optimization_failure_keeps_previous_route() {
    use crate::api::SessionAPI;
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = routed_engine(Arc::new(reordering_stub()));
    let token = block_on(engine.create_session()).unwrap().token;
    block_on(engine.add_address(token, "123 Main".into())).unwrap();
    block_on(engine.add_address(token, "456 Oak".into())).unwrap();
    let routed = block_on(engine.generate_route(token)).unwrap();

    let failing = Arc::new(super::stub::StubRouting {
        optimization: None,
        ..reordering_stub()
    });
    let engine = Engine {
        routing: failing.clone(),
        ..engine
    };

    let err = block_on(engine.generate_route(token)).unwrap_err();
    assert_eq!(err.code, 200);

    let after = block_on(engine.find_session(token)).unwrap();
    assert_eq!(after.selection, routed.selection);
    assert_eq!(after.route(), routed.route());
    assert!(failing.directions_calls.lock().unwrap().is_empty());
}

#[test]
fn generate_and_clear_without_selection() {
    use crate::api::SessionAPI;
    use crate::entities::SessionStatus;
    use std::sync::Arc;
    use tokio_test::block_on;

    let stub = Arc::new(reordering_stub());
    let engine = routed_engine(stub.clone());
    let token = block_on(engine.create_session()).unwrap().token;

    let session = block_on(engine.generate_route(token)).unwrap();
    assert_eq!(session.status, SessionStatus::Empty);
    assert!(stub.optimize_calls.lock().unwrap().is_empty());

    block_on(engine.add_address(token, "Oak".into())).unwrap();
    let session = block_on(engine.clear_route(token)).unwrap();
    assert!(session.selection.is_empty());
    assert_eq!(session.status, SessionStatus::Empty);
}
