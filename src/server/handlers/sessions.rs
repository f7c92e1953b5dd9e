use axum::extract::{Extension, Json, Path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{RouteResult, Session, StopMarker};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct AddAddressParams {
    query: String,
}

#[derive(Serialize, Deserialize)]
pub struct RouteView {
    stops: Vec<StopMarker>,
    path: Vec<[f64; 2]>,
    instructions: Vec<String>,
}

impl From<&RouteResult> for RouteView {
    fn from(route: &RouteResult) -> Self {
        Self {
            stops: route.markers(),
            path: route.path.clone(),
            instructions: route.instructions(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SessionView {
    token: Uuid,
    selection: Vec<String>,
    status: String,
    route: Option<RouteView>,
    updated_at: DateTime<Utc>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            route: session.route().map(RouteView::from),
            status: session.status.name(),
            token: session.token,
            selection: session.selection,
            updated_at: session.updated_at,
        }
    }
}

pub async fn create(Extension(api): Extension<DynAPI>) -> Result<Json<SessionView>, Error> {
    let session = api.create_session().await?;

    Ok(Json(session.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(token): Path<Uuid>,
) -> Result<Json<SessionView>, Error> {
    let session = api.find_session(token).await?;

    Ok(Json(session.into()))
}

pub async fn add_address(
    Extension(api): Extension<DynAPI>,
    Path(token): Path<Uuid>,
    Json(params): Json<AddAddressParams>,
) -> Result<Json<SessionView>, Error> {
    let session = api.add_address(token, params.query).await?;

    Ok(Json(session.into()))
}

pub async fn generate_route(
    Extension(api): Extension<DynAPI>,
    Path(token): Path<Uuid>,
) -> Result<Json<SessionView>, Error> {
    let session = api.generate_route(token).await?;

    Ok(Json(session.into()))
}

pub async fn clear_route(
    Extension(api): Extension<DynAPI>,
    Path(token): Path<Uuid>,
) -> Result<Json<SessionView>, Error> {
    let session = api.clear_route(token).await?;

    Ok(Json(session.into()))
}

#[test]
fn session_view_flattens_route() {
    use crate::entities::{Coordinates, Leg};

    let mut session = Session::new();
    session.select(vec!["123 Main St".into(), "456 Oak Ave".into()]);
    session.complete(RouteResult {
        stops: vec![Coordinates::new(45.0, -73.0), Coordinates::new(46.5, -72.25)],
        path: vec![[45.0, -73.0], [46.5, -72.25]],
        legs: vec![Leg {
            destination: "456 Oak Ave".into(),
            steps: vec!["- Turn left onto Elm St (450m)".into()],
        }],
    });

    let view = SessionView::from(session);
    let json = serde_json::to_value(&view).unwrap();

    assert_eq!(json["status"], "routed");
    assert_eq!(json["route"]["stops"][0]["label"], "Start Point");
    assert_eq!(json["route"]["stops"][1]["label"], "Stop #2");
    assert_eq!(
        json["route"]["instructions"],
        serde_json::json!(["To 456 Oak Ave:", "- Turn left onto Elm St (450m)"])
    );

    let view = SessionView::from(Session::new());
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["status"], "empty");
    assert!(json["route"].is_null());
}
