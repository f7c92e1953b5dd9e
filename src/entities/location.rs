use geo_types::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::entities::AddressRecord;

/// A latitude/longitude pair. Two records share a location when both
/// components compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Routing services take positions in `[lon, lat]` order.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn from_lon_lat([longitude, latitude]: [f64; 2]) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn lat_lon(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Point::new(coordinates.longitude, coordinates.latitude)
    }
}

impl From<Point<f64>> for Coordinates {
    fn from(point: Point<f64>) -> Self {
        Self {
            latitude: point.y(),
            longitude: point.x(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationGroup {
    pub location: Coordinates,
    pub members: Vec<AddressRecord>,
}

impl LocationGroup {
    /// Address shown in the marker popup, taken from the first member.
    pub fn address(&self) -> Option<&str> {
        self.members.first().map(|m| m.full_address.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            south_west: Point::from(rect.min()).into(),
            north_east: Point::from(rect.max()).into(),
        }
    }
}

const SEARCH_MARKER_OFFSET: f64 = 0.0005;
const SEARCH_BOUNDS_MARGIN: f64 = 0.01;

/// Where the map should focus after a successful search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchFocus {
    pub location: Coordinates,
    pub marker: Coordinates,
    pub bounds: Bounds,
}

impl SearchFocus {
    pub fn new(location: Coordinates) -> Self {
        let marker = Coordinates::new(location.latitude + SEARCH_MARKER_OFFSET, location.longitude);

        let center: Point<f64> = location.into();
        let margin = Point::new(SEARCH_BOUNDS_MARGIN, SEARCH_BOUNDS_MARGIN);
        let bounds = Rect::new(center - margin, center + margin);

        Self {
            location,
            marker,
            bounds: bounds.into(),
        }
    }
}

#[test]
fn coordinates_lon_lat_order() {
    let coordinates = Coordinates::new(45.0, -73.0);

    assert_eq!(coordinates.lon_lat(), [-73.0, 45.0]);
    assert_eq!(coordinates.lat_lon(), [45.0, -73.0]);
    assert_eq!(Coordinates::from_lon_lat([-73.0, 45.0]), coordinates);
}

#[test]
fn search_focus_surrounds_location() {
    let focus = SearchFocus::new(Coordinates::new(45.0, -73.0));

    assert!((focus.marker.latitude - 45.0005).abs() < 1e-9);
    assert_eq!(focus.marker.longitude, -73.0);
    assert!((focus.bounds.south_west.latitude - 44.99).abs() < 1e-9);
    assert!((focus.bounds.south_west.longitude + 73.01).abs() < 1e-9);
    assert!((focus.bounds.north_east.latitude - 45.01).abs() < 1e-9);
    assert!((focus.bounds.north_east.longitude + 72.99).abs() < 1e-9);
}
