use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{
    entities::{
        address::{DEFAULT_PRIORITY, FULL_ADDRESS, FULL_NAME, LATITUDE, LONGITUDE, PRIORITY},
        color::NUMBER_OF_PRACTITIONERS,
        AddressRecord, Attribute, Coordinates, LocationGroup,
    },
    error::{data_load_error, Error},
};

const REQUIRED_COLUMNS: [&str; 5] = [LATITUDE, LONGITUDE, FULL_ADDRESS, FULL_NAME, PRIORITY];

const LOCATION_COLUMNS: [&str; 7] = [
    "City",
    "State",
    "Address",
    "Zip",
    LATITUDE,
    LONGITUDE,
    FULL_ADDRESS,
];

pub const DEFAULT_POPUP_COLUMNS: [&str; 6] = [
    "First Name",
    "Last Name",
    "Specialty",
    PRIORITY,
    "Total Product1 Scripts 2024",
    "Total Product1 Scripts 2025",
];

/// Priority stored for rows whose priority cell is blank or not a number.
const BLANK_PRIORITY: f64 = -1.0;

/// The loaded address dataset. Read-only once constructed.
#[derive(Clone, Debug, Default)]
pub struct AddressTable {
    columns: Vec<String>,
    numeric_columns: BTreeSet<String>,
    records: Vec<AddressRecord>,
}

impl AddressTable {
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)
            .map_err(|e| data_load_error(format!("{}: {}", path.display(), e)))?;
        let table = Self::from_reader(file)?;

        tracing::info!(
            "loaded {} address records from {}",
            table.records.len(),
            path.display()
        );

        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let index_of = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| data_load_error(format!("missing required column {:?}", name)))
        };
        let latitude = index_of(LATITUDE)?;
        let longitude = index_of(LONGITUDE)?;
        let full_address = index_of(FULL_ADDRESS)?;
        let full_name = index_of(FULL_NAME)?;
        let priority = index_of(PRIORITY)?;

        let mut numeric_columns: BTreeSet<String> = columns
            .iter()
            .filter(|c| !REQUIRED_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        numeric_columns.insert(LATITUDE.into());
        numeric_columns.insert(LONGITUDE.into());
        numeric_columns.insert(PRIORITY.into());

        let mut records = vec![];

        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let field = |index: usize| record.get(index).unwrap_or("");
            let number = |index: usize| field(index).trim().parse::<f64>().ok();

            let (lat, lon) = match (number(latitude), number(longitude)) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    tracing::warn!(
                        "skipping row {}: no usable coordinates ({:?}, {:?})",
                        row + 1,
                        field(latitude),
                        field(longitude)
                    );
                    continue;
                }
            };

            let raw_priority = number(priority).unwrap_or(BLANK_PRIORITY);

            let mut attributes = BTreeMap::new();
            for (index, column) in columns.iter().enumerate() {
                if REQUIRED_COLUMNS.contains(&column.as_str()) {
                    continue;
                }

                let attribute = Attribute::parse(field(index));
                if attribute.as_number().is_none() && !attribute.is_empty() {
                    numeric_columns.remove(column);
                }
                attributes.insert(column.clone(), attribute);
            }

            records.push(AddressRecord {
                full_address: field(full_address).into(),
                full_name: field(full_name).into(),
                coordinates: Coordinates::new(lat, lon),
                priority: if raw_priority == 0.0 {
                    DEFAULT_PRIORITY
                } else {
                    raw_priority
                },
                attributes,
            });
        }

        Ok(Self {
            columns,
            numeric_columns,
            records,
        })
    }

    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.contains(column)
    }

    /// Groups records sharing the exact same coordinates. Groups come out
    /// ordered by latitude then longitude; members keep table order.
    pub fn group_by_location(&self) -> Vec<LocationGroup> {
        let mut sorted: Vec<&AddressRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            a.coordinates
                .latitude
                .total_cmp(&b.coordinates.latitude)
                .then(a.coordinates.longitude.total_cmp(&b.coordinates.longitude))
        });

        let mut groups: Vec<LocationGroup> = vec![];

        for record in sorted {
            match groups.last_mut() {
                Some(group) if group.location == record.coordinates => {
                    group.members.push(record.clone())
                }
                _ => groups.push(LocationGroup {
                    location: record.coordinates,
                    members: vec![record.clone()],
                }),
            }
        }

        groups
    }

    /// Location of the first record whose address or name contains `query`,
    /// ignoring case.
    pub fn find_first_match(&self, query: &str) -> Option<Coordinates> {
        if query.is_empty() {
            return None;
        }

        self.records
            .iter()
            .find(|r| r.matches(query))
            .map(|r| r.coordinates)
    }

    /// Every full address containing `partial`, ignoring case, in table order.
    pub fn matching_addresses(&self, partial: &str) -> Vec<String> {
        if partial.is_empty() {
            return vec![];
        }

        let partial = partial.to_lowercase();

        self.records
            .iter()
            .filter(|r| r.full_address.to_lowercase().contains(&partial))
            .map(|r| r.full_address.clone())
            .collect()
    }

    pub fn coordinates_of(&self, address: &str) -> Option<Coordinates> {
        self.records
            .iter()
            .find(|r| r.full_address == address)
            .map(|r| r.coordinates)
    }

    pub fn address_at(&self, coordinates: Coordinates) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.coordinates == coordinates)
            .map(|r| r.full_address.as_str())
    }

    /// Mean of all record coordinates.
    pub fn center(&self) -> Option<Coordinates> {
        if self.records.is_empty() {
            return None;
        }

        let n = self.records.len() as f64;
        let (latitude, longitude) = self.records.iter().fold((0.0, 0.0), |(lat, lon), r| {
            (lat + r.coordinates.latitude, lon + r.coordinates.longitude)
        });

        Some(Coordinates::new(latitude / n, longitude / n))
    }

    /// Largest numeric value of `column` over all records.
    pub fn column_max(&self, column: &str) -> Option<f64> {
        self.records
            .iter()
            .filter_map(|r| r.attribute(column))
            .filter_map(|a| a.as_number())
            .reduce(f64::max)
    }

    /// Attributes markers can be colored by.
    pub fn color_attributes(&self) -> Vec<String> {
        let mut numeric: Vec<String> = self
            .columns
            .iter()
            .filter(|c| self.is_numeric(c))
            .filter(|c| !LOCATION_COLUMNS.contains(&c.as_str()) && c.as_str() != FULL_NAME)
            .cloned()
            .collect();
        numeric.sort();
        numeric.dedup();

        std::iter::once(NUMBER_OF_PRACTITIONERS.to_string())
            .chain(numeric)
            .collect()
    }

    /// Columns that can be shown in a marker popup.
    pub fn popup_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !LOCATION_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        columns.sort();
        columns.dedup();

        columns
    }

    pub fn default_popup_columns(&self) -> Vec<String> {
        DEFAULT_POPUP_COLUMNS
            .iter()
            .filter(|c| self.columns.iter().any(|column| column == **c))
            .map(|c| c.to_string())
            .collect()
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CSV: &str = "\
 First Name , Last Name ,Full Name,Specialty,Priority,Total Scripts,City,Latitude,Longitude,Full_Address
Alice,Smith,Alice Smith,Cardiology,0,10,Springfield,45.0,-73.0,123 Main St
Bob,Jones,Bob Jones,Oncology,2,5,Springfield,45.0,-73.0,123 Main St
Carol,White,Carol White,Cardiology,1,7,Shelbyville,46.5,-72.25,456 Oak Ave
Dan,Brown,Dan Brown,Pediatrics,3,,Shelbyville,44.0,-74.0,789 Main Street
";

#[test]
fn load_normalizes_columns_and_priority() {
    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();

    assert_eq!(table.records().len(), 4);
    assert_eq!(table.columns()[0], "First Name");
    assert_eq!(table.columns()[1], "Last Name");

    let priorities: Vec<f64> = table.records().iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![5.0, 2.0, 1.0, 3.0]);

    assert_eq!(
        table.records()[0].attribute("First Name"),
        Some(Attribute::Text("Alice".into()))
    );
    assert!(table.is_numeric("Total Scripts"));
    assert!(!table.is_numeric("Specialty"));
}

#[test]
fn load_rejects_missing_columns() {
    let csv = "Latitude,Longitude,Full_Address\n1.0,2.0,1 Elm St\n";

    let err = AddressTable::from_reader(csv.as_bytes()).unwrap_err();
    assert_eq!(err.code, 6);
}

#[test]
fn load_skips_rows_without_coordinates() {
    let csv = "\
Latitude,Longitude,Full_Address,Full Name,Priority,Specialty
north,2.0,1 Elm St,A,1,Cardiology
1.0,,2 Elm St,B,1,Cardiology
3.0,4.0,3 Elm St,C,high,Oncology
5.0,6.0,4 Elm St,D
";

    let table = AddressTable::from_reader(csv.as_bytes()).unwrap();
    let addresses: Vec<&str> = table
        .records()
        .iter()
        .map(|r| r.full_address.as_str())
        .collect();
    assert_eq!(addresses, vec!["3 Elm St", "4 Elm St"]);

    assert_eq!(table.records()[0].priority, -1.0);
    assert_eq!(table.records()[1].priority, -1.0);
    assert_eq!(
        table.records()[1].attribute("Specialty"),
        Some(Attribute::Text("".into()))
    );
}

#[test]
fn load_missing_file() {
    let err = AddressTable::load(Path::new("/nonexistent/addresses.csv")).unwrap_err();
    assert_eq!(err.code, 6);
}

#[test]
fn group_by_location_partitions_records() {
    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
    let groups = table.group_by_location();

    assert_eq!(groups.len(), 3);
    assert_eq!(
        groups.iter().map(|g| g.members.len()).sum::<usize>(),
        table.records().len()
    );

    let shared = groups
        .iter()
        .find(|g| g.location == Coordinates::new(45.0, -73.0))
        .unwrap();
    let names: Vec<&str> = shared.members.iter().map(|m| m.full_name.as_str()).collect();
    assert_eq!(names, vec!["Alice Smith", "Bob Jones"]);
    assert_eq!(shared.address(), Some("123 Main St"));

    assert_eq!(groups[0].location, Coordinates::new(44.0, -74.0));
}

#[test]
fn find_first_match_by_name_or_address() {
    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();

    assert_eq!(
        table.find_first_match("OAK"),
        Some(Coordinates::new(46.5, -72.25))
    );
    assert_eq!(
        table.find_first_match("bob"),
        Some(Coordinates::new(45.0, -73.0))
    );
    assert_eq!(
        table.find_first_match("main"),
        Some(Coordinates::new(45.0, -73.0))
    );
    assert_eq!(table.find_first_match(""), None);
    assert_eq!(table.find_first_match("nowhere"), None);
}

#[test]
fn matching_addresses_in_table_order() {
    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();

    assert_eq!(
        table.matching_addresses("main"),
        vec!["123 Main St", "123 Main St", "789 Main Street"]
    );
    assert!(table.matching_addresses("").is_empty());
    assert!(table.matching_addresses("alice").is_empty());
}

#[test]
fn exact_lookups() {
    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();

    assert_eq!(
        table.coordinates_of("456 Oak Ave"),
        Some(Coordinates::new(46.5, -72.25))
    );
    assert_eq!(table.coordinates_of("456 oak ave"), None);
    assert_eq!(
        table.address_at(Coordinates::new(44.0, -74.0)),
        Some("789 Main Street")
    );
    assert_eq!(table.address_at(Coordinates::new(0.0, 0.0)), None);
}

#[test]
fn address_at_prefers_first_row_at_shared_location() {
    let csv = "\
Latitude,Longitude,Full_Address,Full Name,Priority
45.0,-73.0,Suite 200 123 Main St,A,1
44.0,-74.0,789 Main Street,B,1
45.0,-73.0,Suite 100 123 Main St,C,1
";
    let table = AddressTable::from_reader(csv.as_bytes()).unwrap();

    assert_eq!(
        table.address_at(Coordinates::new(45.0, -73.0)),
        Some("Suite 200 123 Main St")
    );
    assert_eq!(
        table.coordinates_of("Suite 100 123 Main St"),
        Some(Coordinates::new(45.0, -73.0))
    );
}

#[test]
fn attribute_listings() {
    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();

    assert_eq!(
        table.color_attributes(),
        vec!["Number of Practitioners", "Priority", "Total Scripts"]
    );
    assert_eq!(
        table.popup_columns(),
        vec![
            "First Name",
            "Full Name",
            "Last Name",
            "Priority",
            "Specialty",
            "Total Scripts"
        ]
    );
    assert_eq!(
        table.default_popup_columns(),
        vec!["First Name", "Last Name", "Specialty", "Priority"]
    );
    assert_eq!(table.column_max("Total Scripts"), Some(10.0));
}

#[test]
fn center_is_mean_coordinate() {
    let table = AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
    let center = table.center().unwrap();

    assert!((center.latitude - 45.125).abs() < 1e-9);
    assert!((center.longitude + 73.0625).abs() < 1e-9);
    assert!(AddressTable::default().center().is_none());
}
