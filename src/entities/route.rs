use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// A selected address resolved to its coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub coordinates: Coordinates,
}

/// Turn-by-turn lines for travelling to one stop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub destination: String,
    pub steps: Vec<String>,
}

impl Leg {
    pub fn header(&self) -> String {
        format!("To {}:", self.destination)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopMarker {
    pub coordinates: Coordinates,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Stops in visiting order, starting with the vehicle origin.
    pub stops: Vec<Coordinates>,
    /// Path points as `[lat, lon]`.
    pub path: Vec<[f64; 2]>,
    pub legs: Vec<Leg>,
}

impl RouteResult {
    pub fn instructions(&self) -> Vec<String> {
        self.legs
            .iter()
            .flat_map(|leg| std::iter::once(leg.header()).chain(leg.steps.iter().cloned()))
            .collect()
    }

    pub fn markers(&self) -> Vec<StopMarker> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, &coordinates)| StopMarker {
                coordinates,
                label: match i {
                    0 => "Start Point".into(),
                    _ => format!("Stop #{}", i + 1),
                },
            })
            .collect()
    }
}

#[test]
fn instructions_are_grouped_per_leg() {
    let route = RouteResult {
        stops: vec![Coordinates::new(1.0, 2.0), Coordinates::new(3.0, 4.0)],
        path: vec![[1.0, 2.0], [3.0, 4.0]],
        legs: vec![
            Leg {
                destination: "456 Oak Ave".into(),
                steps: vec!["- Head north (120m)".into(), "- Arrive (0m)".into()],
            },
            Leg {
                destination: "Stop 3".into(),
                steps: vec!["- Turn left onto Elm St (450m)".into()],
            },
        ],
    };

    assert_eq!(
        route.instructions(),
        vec![
            "To 456 Oak Ave:",
            "- Head north (120m)",
            "- Arrive (0m)",
            "To Stop 3:",
            "- Turn left onto Elm St (450m)",
        ]
    );

    let labels: Vec<String> = route.markers().into_iter().map(|m| m.label).collect();
    assert_eq!(labels, vec!["Start Point", "Stop #2"]);
}
