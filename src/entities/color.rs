use serde::{Deserialize, Serialize};

use crate::entities::address::PRIORITY;
use crate::entities::LocationGroup;

pub const NUMBER_OF_PRACTITIONERS: &str = "Number of Practitioners";

/// Priorities equal to this are ignored when picking a group's color.
const PRIORITY_UNSET: f64 = -1.0;

#[derive(Clone, Debug, PartialEq)]
pub enum ColorBy {
    NumberOfPractitioners,
    Priority,
    Attribute(String),
}

impl ColorBy {
    pub fn parse(name: &str) -> Self {
        match name {
            NUMBER_OF_PRACTITIONERS => Self::NumberOfPractitioners,
            PRIORITY => Self::Priority,
            other => Self::Attribute(other.into()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::NumberOfPractitioners => NUMBER_OF_PRACTITIONERS,
            Self::Priority => PRIORITY,
            Self::Attribute(name) => name,
        }
    }

    /// The value a marker is colored by.
    ///
    /// Arbitrary numeric attributes are summed across the group's members;
    /// non-numeric cells count as zero.
    pub fn value(&self, group: &LocationGroup) -> f64 {
        match self {
            Self::NumberOfPractitioners => group.members.len() as f64,
            Self::Priority => group
                .members
                .iter()
                .map(|m| m.priority)
                .filter(|&p| p != PRIORITY_UNSET)
                .reduce(f64::min)
                .unwrap_or(PRIORITY_UNSET),
            Self::Attribute(name) => group
                .members
                .iter()
                .filter_map(|m| m.attribute(name))
                .filter_map(|a| a.as_number())
                .sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalization {
    Linear { min: f64, max: f64 },
    Log { min: f64, max: f64 },
}

impl Normalization {
    /// Maps `value` onto `[0, 1]` for in-range values. Values outside the
    /// range map outside `[0, 1]`; `None` means the value cannot be placed
    /// on the scale at all.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }

        match *self {
            Self::Linear { min, max } => {
                if min == max {
                    return Some(0.0);
                }
                Some((value - min) / (max - min))
            }
            Self::Log { min, max } => {
                if value <= 0.0 {
                    return None;
                }
                Some((value.ln() - min.ln()) / (max.ln() - min.ln()))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    pub attribute: String,
    pub normalization: Normalization,
    pub inverted: bool,
}

impl ColorScale {
    /// Range for group sizes starts at minus half the smallest group so that
    /// singletons do not take the darkest color.
    pub fn group_size(min_size: usize, max_size: usize) -> Self {
        Self {
            attribute: NUMBER_OF_PRACTITIONERS.into(),
            normalization: Normalization::Linear {
                min: -(min_size as f64) / 2.0,
                max: max_size as f64,
            },
            inverted: false,
        }
    }

    pub fn priority() -> Self {
        Self {
            attribute: PRIORITY.into(),
            normalization: Normalization::Log { min: 1.0, max: 5.0 },
            inverted: true,
        }
    }

    pub fn attribute(name: &str, max: f64) -> Self {
        Self {
            attribute: name.into(),
            normalization: Normalization::Linear {
                min: -max / 2.0,
                max,
            },
            inverted: false,
        }
    }

    pub fn color(&self, value: f64) -> String {
        match self.normalization.normalize(value) {
            Some(t) => {
                let t = t.clamp(0.0, 1.0);
                viridis(if self.inverted { 1.0 - t } else { t })
            }
            None => MASKED_COLOR.into(),
        }
    }
}

const MASKED_COLOR: &str = "#000000";

/// Samples the viridis ramp at `t` in `[0, 1]` and renders it as `#rrggbb`.
pub fn viridis(t: f64) -> String {
    format!("#{:x}", colorous::VIRIDIS.eval_continuous(t.clamp(0.0, 1.0)))
}

#[test]
fn viridis_endpoints() {
    assert_eq!(viridis(0.0), "#440154");
    assert_eq!(viridis(1.0), "#fde725");
    assert_eq!(viridis(7.0), "#fde725");
    assert_eq!(viridis(-2.0), "#440154");

    let middle = viridis(0.5);
    assert_eq!(middle.len(), 7);
    assert!(middle.starts_with("#2"));
}

#[test]
fn group_size_scale_has_half_negative_lower_bound() {
    let scale = ColorScale::group_size(2, 6);

    assert_eq!(
        scale.normalization,
        Normalization::Linear {
            min: -1.0,
            max: 6.0
        }
    );
    assert_eq!(scale.normalization.normalize(6.0), Some(1.0));
    assert_eq!(scale.normalization.normalize(-1.0), Some(0.0));
}

#[test]
fn priority_scale_is_inverted_log() {
    let scale = ColorScale::priority();

    assert_eq!(scale.normalization.normalize(1.0), Some(0.0));
    assert_eq!(scale.normalization.normalize(5.0), Some(1.0));
    assert_eq!(scale.normalization.normalize(-1.0), None);
    assert_eq!(scale.color(1.0), "#fde725");
    assert_eq!(scale.color(5.0), "#440154");
    assert_eq!(scale.color(-1.0), "#000000");
}

#[test]
fn attribute_scale_uses_half_negative_max() {
    let scale = ColorScale::attribute("Total Scripts", 100.0);

    assert_eq!(
        scale.normalization,
        Normalization::Linear {
            min: -50.0,
            max: 100.0
        }
    );
    assert_eq!(scale.color(250.0), "#fde725");
}

#[test]
fn color_value_per_attribute() {
    use crate::entities::{AddressRecord, Attribute, Coordinates};
    use std::collections::BTreeMap;

    let member = |priority: f64, scripts: f64| AddressRecord {
        full_address: "1 Elm St".into(),
        full_name: "A".into(),
        coordinates: Coordinates::new(1.0, 2.0),
        priority,
        attributes: BTreeMap::from([("Scripts".to_string(), Attribute::Number(scripts))]),
    };
    let group = LocationGroup {
        location: Coordinates::new(1.0, 2.0),
        members: vec![member(3.0, 10.0), member(-1.0, 5.0), member(2.0, 1.5)],
    };

    assert_eq!(ColorBy::NumberOfPractitioners.value(&group), 3.0);
    assert_eq!(ColorBy::Priority.value(&group), 2.0);
    assert_eq!(ColorBy::parse("Scripts").value(&group), 16.5);

    let unset = LocationGroup {
        location: Coordinates::new(1.0, 2.0),
        members: vec![member(-1.0, 0.0)],
    };
    assert_eq!(ColorBy::Priority.value(&unset), -1.0);
}
