use axum::extract::{Extension, Json, Query};
use serde::{Deserialize, Serialize};

use crate::entities::{AttributeListing, LocationMap, SearchFocus};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    color_by: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    query: String,
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<ListParams>,
) -> Result<Json<LocationMap>, Error> {
    let map = api.list_locations(params.color_by).await?;

    Ok(map.into())
}

pub async fn attributes(
    Extension(api): Extension<DynAPI>,
) -> Result<Json<AttributeListing>, Error> {
    let listing = api.list_attributes().await?;

    Ok(listing.into())
}

pub async fn search(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Option<SearchFocus>>, Error> {
    let focus = api.search(params.query).await?;

    Ok(focus.into())
}
