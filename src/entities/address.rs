use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const FULL_ADDRESS: &str = "Full_Address";
pub const FULL_NAME: &str = "Full Name";
pub const PRIORITY: &str = "Priority";

/// Priority used in place of an unset (zero) priority.
pub const DEFAULT_PRIORITY: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Number(f64),
    Text(String),
}

impl Attribute {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(raw.into()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressRecord {
    pub full_address: String,
    pub full_name: String,
    pub coordinates: Coordinates,
    pub priority: f64,
    pub attributes: BTreeMap<String, Attribute>,
}

impl AddressRecord {
    /// Looks up any column by its (trimmed) header name, including the
    /// columns that are stored as dedicated fields.
    pub fn attribute(&self, column: &str) -> Option<Attribute> {
        match column {
            LATITUDE => Some(Attribute::Number(self.coordinates.latitude)),
            LONGITUDE => Some(Attribute::Number(self.coordinates.longitude)),
            FULL_ADDRESS => Some(Attribute::Text(self.full_address.clone())),
            FULL_NAME => Some(Attribute::Text(self.full_name.clone())),
            PRIORITY => Some(Attribute::Number(self.priority)),
            _ => self.attributes.get(column).cloned(),
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();

        self.full_address.to_lowercase().contains(&query)
            || self.full_name.to_lowercase().contains(&query)
    }
}

#[test]
fn attribute_parsing() {
    assert_eq!(Attribute::parse("12"), Attribute::Number(12.0));
    assert_eq!(Attribute::parse(" 2.5 "), Attribute::Number(2.5));
    assert_eq!(
        Attribute::parse("Cardiology"),
        Attribute::Text("Cardiology".into())
    );
    assert!(Attribute::parse("").is_empty());
}

#[test]
fn record_matches_name_or_address() {
    let record = AddressRecord {
        full_address: "123 Main St, Springfield".into(),
        full_name: "Alice Smith".into(),
        coordinates: Coordinates::new(45.0, -73.0),
        priority: 1.0,
        attributes: BTreeMap::new(),
    };

    assert!(record.matches("main st"));
    assert!(record.matches("ALICE"));
    assert!(!record.matches("oak"));
    assert_eq!(record.attribute(PRIORITY), Some(Attribute::Number(1.0)));
    assert_eq!(record.attribute("Specialty"), None);
}
