use serde::{Deserialize, Serialize};

use crate::entities::{AddressRecord, ColorScale, Coordinates};

/// A colored marker for one location group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Marker {
    pub location: Coordinates,
    pub address: String,
    pub color: String,
    pub color_value: f64,
    pub members: Vec<AddressRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationMap {
    pub center: Option<Coordinates>,
    pub scale: ColorScale,
    pub markers: Vec<Marker>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributeListing {
    pub color_attributes: Vec<String>,
    pub popup_columns: Vec<String>,
    pub default_popup_columns: Vec<String>,
}
