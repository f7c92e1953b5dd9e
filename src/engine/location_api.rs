use super::Engine;

use async_trait::async_trait;

use crate::{
    api::LocationAPI,
    entities::{
        AttributeListing, ColorBy, ColorScale, LocationGroup, LocationMap, Marker, SearchFocus,
    },
    error::{invalid_input_error, Error},
};

impl Engine {
    fn color_scale(&self, color_by: &ColorBy, groups: &[LocationGroup]) -> Result<ColorScale, Error> {
        match color_by {
            ColorBy::NumberOfPractitioners => {
                let sizes = groups.iter().map(|g| g.members.len());
                let min = sizes.clone().min().unwrap_or(0);
                let max = sizes.max().unwrap_or(0);

                Ok(ColorScale::group_size(min, max))
            }
            ColorBy::Priority => Ok(ColorScale::priority()),
            ColorBy::Attribute(name) => {
                if !self.table.color_attributes().contains(name) {
                    tracing::info!("cannot color by {:?}", name);
                    return Err(invalid_input_error());
                }

                let max = self.table.column_max(name).unwrap_or(0.0);
                Ok(ColorScale::attribute(name, max))
            }
        }
    }
}

#[async_trait]
impl LocationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_locations(&self, color_by: Option<String>) -> Result<LocationMap, Error> {
        let color_by = color_by
            .as_deref()
            .map(ColorBy::parse)
            .unwrap_or(ColorBy::NumberOfPractitioners);

        let groups = self.table.group_by_location();
        let scale = self.color_scale(&color_by, &groups)?;
        tracing::info!("coloring {} locations by {:?}", groups.len(), color_by.name());

        let markers = groups
            .into_iter()
            .map(|group| {
                let color_value = color_by.value(&group);

                Marker {
                    location: group.location,
                    address: group.address().unwrap_or_default().to_string(),
                    color: scale.color(color_value),
                    color_value,
                    members: group.members,
                }
            })
            .collect();

        Ok(LocationMap {
            center: self.table.center(),
            scale,
            markers,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_attributes(&self) -> Result<AttributeListing, Error> {
        Ok(AttributeListing {
            color_attributes: self.table.color_attributes(),
            popup_columns: self.table.popup_columns(),
            default_popup_columns: self.table.default_popup_columns(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, query: String) -> Result<Option<SearchFocus>, Error> {
        Ok(self.table.find_first_match(&query).map(SearchFocus::new))
    }
}

#[cfg(test)]
fn sample_engine() -> Engine {
    use super::stub::StubRouting;
    use crate::table::{AddressTable, SAMPLE_CSV};
    use std::sync::Arc;

    Engine::new(
        AddressTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap(),
        Arc::new(StubRouting::default()),
        "driving-car".into(),
    )
}

#[test]
fn list_locations_by_group_size() {
    use crate::entities::color::Normalization;
    use tokio_test::block_on;

    let engine = sample_engine();
    let map = block_on(engine.list_locations(None)).unwrap();

    assert_eq!(map.markers.len(), 3);
    assert_eq!(
        map.scale.normalization,
        Normalization::Linear {
            min: -0.5,
            max: 2.0
        }
    );

    let shared = map
        .markers
        .iter()
        .find(|m| m.address == "123 Main St")
        .unwrap();
    assert_eq!(shared.color_value, 2.0);
    assert_eq!(shared.color, "#fde725");
    assert_eq!(shared.members.len(), 2);
}

#[test]
fn list_locations_by_priority_and_attribute() {
    use tokio_test::block_on;

    let engine = sample_engine();

    let map = block_on(engine.list_locations(Some("Priority".into()))).unwrap();
    assert!(map.scale.inverted);
    let shared = map
        .markers
        .iter()
        .find(|m| m.address == "123 Main St")
        .unwrap();
    assert_eq!(shared.color_value, 2.0);

    let map = block_on(engine.list_locations(Some("Total Scripts".into()))).unwrap();
    let shared = map
        .markers
        .iter()
        .find(|m| m.address == "123 Main St")
        .unwrap();
    assert_eq!(shared.color_value, 15.0);

    let err = block_on(engine.list_locations(Some("Specialty".into()))).unwrap_err();
    assert_eq!(err.code, 101);
}

#[test]
fn search_focuses_first_match() {
    use crate::entities::Coordinates;
    use tokio_test::block_on;

    let engine = sample_engine();

    let focus = block_on(engine.search("carol".into())).unwrap().unwrap();
    assert_eq!(focus.location, Coordinates::new(46.5, -72.25));

    assert!(block_on(engine.search("".into())).unwrap().is_none());
    assert!(block_on(engine.search("zzz".into())).unwrap().is_none());
}
