pub mod openrouteservice;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub location: [f64; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub start: [f64; 2],
    pub profile: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub jobs: Vec<Job>,
    pub vehicles: Vec<Vehicle>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OptimizationResponse {
    #[serde(default)]
    pub routes: Vec<OptimizedRoute>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OptimizedRoute {
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

/// A step of an optimized route. `start` and `end` steps carry no job id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteStep {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<u64>,
}

impl RouteStep {
    pub fn job_id(&self) -> Option<u64> {
        match self.kind.as_str() {
            "job" => self.id,
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    pub coordinates: Vec<[f64; 2]>,
}

/// GeoJSON feature collection returned by the directions endpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: LineGeometry,
    pub properties: FeatureProperties,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub steps: Vec<DirectionStep>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DirectionStep {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub distance: f64,
}

/// Remote route optimization and directions.
#[async_trait]
pub trait RoutingService {
    /// Fails with an optimization error on any non-success outcome.
    async fn optimize(&self, request: OptimizationRequest) -> Result<OptimizationResponse, Error>;

    /// Fails with a directions error on any non-success outcome.
    async fn directions(&self, request: DirectionsRequest) -> Result<DirectionsResponse, Error>;
}

#[test]
fn optimization_response_parses_start_steps() {
    let response: OptimizationResponse = serde_json::from_value(serde_json::json!({
        "code": 0,
        "routes": [{
            "vehicle": 1,
            "steps": [
                { "type": "start", "location": [-73.0, 45.0] },
                { "type": "job", "id": 2, "location": [-72.0, 46.0] },
                { "type": "job", "id": 1, "location": [-73.0, 45.0] },
                { "type": "end" }
            ]
        }]
    }))
    .unwrap();

    let ids: Vec<Option<u64>> = response.routes[0].steps.iter().map(|s| s.job_id()).collect();
    assert_eq!(ids, vec![None, Some(2), Some(1), None]);
}

#[test]
fn directions_response_parses_geojson() {
    let response: DirectionsResponse = serde_json::from_value(serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": [[-73.0, 45.0], [-72.0, 46.0]] },
            "properties": {
                "segments": [{
                    "distance": 450.0,
                    "steps": [{ "instruction": "Turn left", "name": "Elm St", "distance": 450.0, "type": 0 }]
                }]
            }
        }]
    }))
    .unwrap();

    let feature = &response.features[0];
    assert_eq!(feature.geometry.coordinates[1], [-72.0, 46.0]);
    assert_eq!(feature.properties.segments[0].steps[0].name, "Elm St");
}
