//! Route construction stages: resolve the selection to stops, order them with
//! the optimization result, then turn the directions result into a route.

use crate::{
    entities::{Coordinates, Leg, RouteResult, Stop},
    error::{directions_error, invalid_input_error, optimization_error, Error},
    external::{
        DirectionStep, DirectionsRequest, DirectionsResponse, Job, OptimizationRequest,
        OptimizationResponse, Vehicle,
    },
    table::AddressTable,
};

const VEHICLE_ID: u64 = 1;

/// Stops in the order returned by the optimizer. The first stop is the
/// vehicle start.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizedOrder {
    pub stops: Vec<Stop>,
}

pub fn resolve_stops(table: &AddressTable, selection: &[String]) -> Result<Vec<Stop>, Error> {
    selection
        .iter()
        .map(|address| {
            let coordinates = table.coordinates_of(address).ok_or_else(|| {
                tracing::warn!("selected address {:?} is not in the table", address);
                invalid_input_error()
            })?;

            Ok(Stop {
                address: address.clone(),
                coordinates,
            })
        })
        .collect()
}

/// One job per stop, ids starting at 1, and a single vehicle starting at the
/// first stop.
pub fn optimization_request(stops: &[Stop], profile: &str) -> Result<OptimizationRequest, Error> {
    let start = stops
        .first()
        .ok_or_else(|| optimization_error("no stops selected"))?;

    Ok(OptimizationRequest {
        jobs: stops
            .iter()
            .enumerate()
            .map(|(i, stop)| Job {
                id: i as u64 + 1,
                location: stop.coordinates.lon_lat(),
            })
            .collect(),
        vehicles: vec![Vehicle {
            id: VEHICLE_ID,
            start: start.coordinates.lon_lat(),
            profile: profile.into(),
        }],
    })
}

/// Keeps only `job` steps of the first route. Jobs the optimizer left out are
/// not reinserted.
pub fn order_stops(stops: &[Stop], response: &OptimizationResponse) -> Result<OptimizedOrder, Error> {
    let route = response
        .routes
        .first()
        .ok_or_else(|| optimization_error("no route returned"))?;

    let mut ordered = vec![];

    for id in route.steps.iter().filter_map(|step| step.job_id()) {
        let stop = (id as usize)
            .checked_sub(1)
            .and_then(|index| stops.get(index))
            .ok_or_else(|| optimization_error(format!("unknown job id {}", id)))?;

        ordered.push(stop.clone());
    }

    if ordered.len() < stops.len() {
        tracing::warn!(
            "optimizer returned {} of {} stops",
            ordered.len(),
            stops.len()
        );
    }

    Ok(OptimizedOrder { stops: ordered })
}

impl OptimizedOrder {
    pub fn directions_request(&self) -> Result<DirectionsRequest, Error> {
        if self.stops.len() < 2 {
            return Err(directions_error("at least two stops are required"));
        }

        Ok(DirectionsRequest {
            coordinates: self.stops.iter().map(|s| s.coordinates.lon_lat()).collect(),
        })
    }

    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.stops.iter().map(|s| s.coordinates).collect()
    }
}

pub fn build_route(
    table: &AddressTable,
    order: &OptimizedOrder,
    response: DirectionsResponse,
) -> Result<RouteResult, Error> {
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or_else(|| directions_error("no route features returned"))?;

    let path = feature
        .geometry
        .coordinates
        .iter()
        .map(|&point| Coordinates::from_lon_lat(point).lat_lon())
        .collect();

    let legs = feature
        .properties
        .segments
        .iter()
        .enumerate()
        .map(|(i, segment)| Leg {
            destination: destination_label(table, order, i),
            steps: segment.steps.iter().map(format_step).collect(),
        })
        .collect();

    Ok(RouteResult {
        stops: order.coordinates(),
        path,
        legs,
    })
}

/// Leg `i` ends at stop `i + 1`; stops are numbered from 1 for display.
fn destination_label(table: &AddressTable, order: &OptimizedOrder, leg: usize) -> String {
    order
        .stops
        .get(leg + 1)
        .and_then(|stop| table.address_at(stop.coordinates))
        .map(|address| address.to_string())
        .unwrap_or_else(|| format!("Stop {}", leg + 2))
}

pub fn format_step(step: &DirectionStep) -> String {
    let mut instruction = step.instruction.clone();

    if !step.name.is_empty() && step.name != "-" && !instruction.contains(&step.name) {
        instruction.push_str(" onto ");
        instruction.push_str(&step.name);
    }

    format!("- {} ({})", instruction, format_distance(step.distance))
}

pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.trunc() as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

#[cfg(test)]
fn sample_stops() -> Vec<Stop> {
    vec![
        Stop {
            address: "123 Main St".into(),
            coordinates: Coordinates::new(45.0, -73.0),
        },
        Stop {
            address: "456 Oak Ave".into(),
            coordinates: Coordinates::new(46.5, -72.25),
        },
    ]
}

#[test]
fn distance_formatting() {
    assert_eq!(format_distance(0.0), "0m");
    assert_eq!(format_distance(850.0), "850m");
    assert_eq!(format_distance(999.9), "999m");
    assert_eq!(format_distance(1000.0), "1.0km");
    assert_eq!(format_distance(1500.0), "1.5km");
    assert_eq!(format_distance(12345.0), "12.3km");
}

#[test]
fn step_formatting() {
    let step = |instruction: &str, name: &str, distance: f64| DirectionStep {
        instruction: instruction.into(),
        name: name.into(),
        distance,
    };

    assert_eq!(
        format_step(&step("Turn left", "Elm St", 450.0)),
        "- Turn left onto Elm St (450m)"
    );
    assert_eq!(
        format_step(&step("Turn right onto Elm St", "Elm St", 1500.0)),
        "- Turn right onto Elm St (1.5km)"
    );
    assert_eq!(
        format_step(&step("Head north", "-", 20.0)),
        "- Head north (20m)"
    );
    assert_eq!(format_step(&step("Arrive", "", 0.0)), "- Arrive (0m)");
}

#[test]
fn resolve_stops_uses_exact_addresses() {
    use crate::table::SAMPLE_CSV;

    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
    let selection = vec!["123 Main St".to_string(), "456 Oak Ave".to_string()];

    assert_eq!(resolve_stops(&table, &selection).unwrap(), sample_stops());

    let err = resolve_stops(&table, &["999 Nowhere".to_string()]).unwrap_err();
    assert_eq!(err.code, 101);
}

#[test]
fn optimization_request_has_one_job_per_stop() {
    let request = optimization_request(&sample_stops(), "driving-car").unwrap();

    assert_eq!(
        request.jobs,
        vec![
            Job {
                id: 1,
                location: [-73.0, 45.0]
            },
            Job {
                id: 2,
                location: [-72.25, 46.5]
            },
        ]
    );
    assert_eq!(
        request.vehicles,
        vec![Vehicle {
            id: 1,
            start: [-73.0, 45.0],
            profile: "driving-car".into()
        }]
    );

    assert_eq!(optimization_request(&[], "driving-car").unwrap_err().code, 200);
}

#[test]
fn order_stops_skips_start_step() {
    let response: OptimizationResponse = serde_json::from_value(serde_json::json!({
        "routes": [{ "steps": [
            { "type": "start" },
            { "type": "job", "id": 2 },
            { "type": "job", "id": 1 },
            { "type": "end" }
        ]}]
    }))
    .unwrap();

    let stops = sample_stops();
    let order = order_stops(&stops, &response).unwrap();

    assert_eq!(order.stops, vec![stops[1].clone(), stops[0].clone()]);
    assert_eq!(
        order.directions_request().unwrap().coordinates,
        vec![[-72.25, 46.5], [-73.0, 45.0]]
    );
}

#[test]
fn order_stops_keeps_partial_result() {
    let response: OptimizationResponse = serde_json::from_value(serde_json::json!({
        "routes": [{ "steps": [{ "type": "start" }, { "type": "job", "id": 1 }] }]
    }))
    .unwrap();

    let stops = sample_stops();
    let order = order_stops(&stops, &response).unwrap();

    assert_eq!(order.stops, vec![stops[0].clone()]);
    assert_eq!(order.directions_request().unwrap_err().code, 201);
}

#[test]
fn order_stops_rejects_malformed_responses() {
    let stops = sample_stops();

    let empty = OptimizationResponse::default();
    assert_eq!(order_stops(&stops, &empty).unwrap_err().code, 200);

    let unknown: OptimizationResponse = serde_json::from_value(serde_json::json!({
        "routes": [{ "steps": [{ "type": "job", "id": 7 }] }]
    }))
    .unwrap();
    assert_eq!(order_stops(&stops, &unknown).unwrap_err().code, 200);
}

#[test]
fn build_route_labels_legs() {
    use crate::table::SAMPLE_CSV;

    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
    let order = OptimizedOrder {
        stops: vec![
            sample_stops()[0].clone(),
            sample_stops()[1].clone(),
            Stop {
                address: "somewhere".into(),
                coordinates: Coordinates::new(10.0, 10.0),
            },
        ],
    };

    let response: DirectionsResponse = serde_json::from_value(serde_json::json!({
        "features": [{
            "geometry": { "coordinates": [[-73.0, 45.0], [-72.25, 46.5], [10.0, 10.0]] },
            "properties": { "segments": [
                { "steps": [{ "instruction": "Turn left", "name": "Elm St", "distance": 450.0 }] },
                { "steps": [{ "instruction": "Arrive", "distance": 0.0 }] }
            ]}
        }]
    }))
    .unwrap();

    let route = build_route(&table, &order, response).unwrap();

    assert_eq!(route.path, vec![[45.0, -73.0], [46.5, -72.25], [10.0, 10.0]]);
    assert_eq!(route.stops, order.coordinates());
    assert_eq!(
        route.instructions(),
        vec![
            "To 456 Oak Ave:",
            "- Turn left onto Elm St (450m)",
            "To Stop 3:",
            "- Arrive (0m)",
        ]
    );
}

#[test]
fn build_route_requires_a_feature() {
    let table = AddressTable::default();
    let order = OptimizedOrder {
        stops: sample_stops(),
    };

    let err = build_route(&table, &order, DirectionsResponse::default()).unwrap_err();
    assert_eq!(err.code, 201);
}

#[test]
fn destination_label_uses_first_row_at_stop() {
    let csv = "\
Latitude,Longitude,Full_Address,Full Name,Priority
44.0,-74.0,789 Main Street,A,1
45.0,-73.0,Suite 200 123 Main St,B,1
45.0,-73.0,Suite 100 123 Main St,C,1
";
    let table = AddressTable::from_reader(csv.as_bytes()).unwrap();
    let order = OptimizedOrder {
        stops: vec![
            Stop {
                address: "789 Main Street".into(),
                coordinates: Coordinates::new(44.0, -74.0),
            },
            Stop {
                address: "Suite 100 123 Main St".into(),
                coordinates: Coordinates::new(45.0, -73.0),
            },
        ],
    };

    assert_eq!(destination_label(&table, &order, 0), "Suite 200 123 Main St");
    assert_eq!(destination_label(&table, &order, 1), "Stop 3");
}
