use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::{
    DirectionsRequest, DirectionsResponse, OptimizationRequest, OptimizationResponse,
    RoutingService,
};
use crate::{
    config::RoutingConfig,
    error::{directions_error, optimization_error, Error},
};

const DIRECTIONS_ACCEPT: &str =
    "application/json, application/geo+json, application/gpx+xml, img/png; charset=utf-8";

/// Client for an OpenRouteService-compatible routing API.
#[derive(Debug)]
pub struct OpenRouteService {
    client: reqwest::Client,
    config: RoutingConfig,
}

impl OpenRouteService {
    pub fn new(config: RoutingConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn optimization_url(&self) -> String {
        format!("{}/optimization", self.config.api_base.trim_end_matches('/'))
    }

    fn directions_url(&self) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.config.api_base.trim_end_matches('/'),
            self.config.profile
        )
    }
}

async fn decode<T: DeserializeOwned>(
    res: reqwest::Response,
    fail: fn(String) -> Error,
) -> Result<T, Error> {
    let status_code = res.status();

    if status_code != StatusCode::OK {
        tracing::warn!("routing service responded with {}", status_code);
        return Err(fail(format!("{}", status_code.as_u16())));
    }

    res.json::<T>()
        .await
        .map_err(|e| fail(format!("malformed response: {}", e)))
}

#[async_trait]
impl RoutingService for OpenRouteService {
    #[tracing::instrument(skip(self, request), fields(jobs = request.jobs.len()))]
    async fn optimize(&self, request: OptimizationRequest) -> Result<OptimizationResponse, Error> {
        let res = self
            .client
            .post(self.optimization_url())
            .header("Authorization", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| optimization_error(e))?;

        decode(res, |detail| optimization_error(detail)).await
    }

    #[tracing::instrument(skip(self, request), fields(stops = request.coordinates.len()))]
    async fn directions(&self, request: DirectionsRequest) -> Result<DirectionsResponse, Error> {
        let res = self
            .client
            .post(self.directions_url())
            .header("Accept", DIRECTIONS_ACCEPT)
            .header("Authorization", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| directions_error(e))?;

        decode(res, |detail| directions_error(detail)).await
    }
}

#[test]
fn endpoint_urls() {
    use std::time::Duration;

    let service = OpenRouteService::new(RoutingConfig {
        api_key: "key".into(),
        api_base: "https://ors.example.org/".into(),
        profile: "driving-hgv".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    assert_eq!(
        service.optimization_url(),
        "https://ors.example.org/optimization"
    );
    assert_eq!(
        service.directions_url(),
        "https://ors.example.org/v2/directions/driving-hgv/geojson"
    );
}

#[test]
fn unreachable_service_is_an_optimization_error() {
    use crate::external::{Job, Vehicle};
    use std::time::Duration;
    use tokio_test::block_on;

    let service = OpenRouteService::new(RoutingConfig {
        api_key: "key".into(),
        api_base: "http://127.0.0.1:9".into(),
        profile: "driving-car".into(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let request = OptimizationRequest {
        jobs: vec![Job {
            id: 1,
            location: [-73.0, 45.0],
        }],
        vehicles: vec![Vehicle {
            id: 1,
            start: [-73.0, 45.0],
            profile: "driving-car".into(),
        }],
    };

    let err = block_on(service.optimize(request)).unwrap_err();
    assert_eq!(err.code, 200);
}

#[cfg(test)]
async fn canned_service(app: axum::Router) -> OpenRouteService {
    use std::time::Duration;

    let server = axum::Server::bind(&([127, 0, 0, 1], 0).into()).serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);

    OpenRouteService::new(RoutingConfig {
        api_key: "key".into(),
        api_base: format!("http://{}", addr),
        profile: "driving-car".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[cfg(test)]
fn two_stop_requests() -> (OptimizationRequest, DirectionsRequest) {
    use crate::external::{Job, Vehicle};

    let optimization = OptimizationRequest {
        jobs: vec![
            Job {
                id: 1,
                location: [-73.0, 45.0],
            },
            Job {
                id: 2,
                location: [-72.25, 46.5],
            },
        ],
        vehicles: vec![Vehicle {
            id: 1,
            start: [-73.0, 45.0],
            profile: "driving-car".into(),
        }],
    };
    let directions = DirectionsRequest {
        coordinates: vec![[-73.0, 45.0], [-72.25, 46.5]],
    };

    (optimization, directions)
}

#[test]
fn error_statuses_map_to_stage_errors() {
    use axum::{http::StatusCode, routing::post, Router};
    use tokio_test::block_on;

    block_on(async {
        let app = Router::new()
            .route(
                "/optimization",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
            )
            .route(
                "/v2/directions/driving-car/geojson",
                post(|| async { StatusCode::NOT_FOUND }),
            );
        let service = canned_service(app).await;
        let (optimization, directions) = two_stop_requests();

        let err = service.optimize(optimization).await.unwrap_err();
        assert_eq!(err.code, 200);
        assert!(err.message.contains("500"));

        let err = service.directions(directions).await.unwrap_err();
        assert_eq!(err.code, 201);
        assert!(err.message.contains("404"));
    });
}

#[test]
fn malformed_bodies_map_to_stage_errors() {
    use axum::{routing::post, Router};
    use tokio_test::block_on;

    block_on(async {
        let app = Router::new()
            .route("/optimization", post(|| async { "not json" }))
            .route(
                "/v2/directions/driving-car/geojson",
                post(|| async { "not json" }),
            );
        let service = canned_service(app).await;
        let (optimization, directions) = two_stop_requests();

        let err = service.optimize(optimization).await.unwrap_err();
        assert_eq!(err.code, 200);
        assert!(err.message.contains("malformed response"));

        let err = service.directions(directions).await.unwrap_err();
        assert_eq!(err.code, 201);
        assert!(err.message.contains("malformed response"));
    });
}

#[test]
fn successful_responses_are_decoded() {
    use axum::{extract::Json, http::HeaderMap, routing::post, Router};
    use serde_json::{json, Value};
    use tokio_test::block_on;

    block_on(async {
        let app = Router::new()
            .route(
                "/optimization",
                post(|headers: HeaderMap| async move {
                    assert_eq!(headers["authorization"], "key");
                    Json(json!({
                        "routes": [{ "steps": [{ "type": "start" }, { "type": "job", "id": 2 }] }]
                    }))
                }),
            )
            .route(
                "/v2/directions/driving-car/geojson",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "features": [{
                            "geometry": { "coordinates": body["coordinates"] },
                            "properties": { "segments": [] }
                        }]
                    }))
                }),
            );
        let service = canned_service(app).await;
        let (optimization, directions) = two_stop_requests();

        let response = service.optimize(optimization).await.unwrap();
        assert_eq!(response.routes[0].steps[1].job_id(), Some(2));

        let response = service.directions(directions).await.unwrap();
        assert_eq!(
            response.features[0].geometry.coordinates,
            vec![[-73.0, 45.0], [-72.25, 46.5]]
        );
    });
}
