use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{AttributeListing, LocationMap, SearchFocus, Session};
use crate::error::Error;

#[async_trait]
pub trait LocationAPI {
    async fn list_locations(&self, color_by: Option<String>) -> Result<LocationMap, Error>;
    async fn list_attributes(&self) -> Result<AttributeListing, Error>;
    async fn search(&self, query: String) -> Result<Option<SearchFocus>, Error>;
}

#[async_trait]
pub trait SessionAPI {
    async fn create_session(&self) -> Result<Session, Error>;
    async fn find_session(&self, token: Uuid) -> Result<Session, Error>;
}

#[async_trait]
pub trait RouteAPI {
    async fn add_address(&self, token: Uuid, query: String) -> Result<Session, Error>;
    async fn clear_route(&self, token: Uuid) -> Result<Session, Error>;
    async fn generate_route(&self, token: Uuid) -> Result<Session, Error>;
}

pub trait API: LocationAPI + SessionAPI + RouteAPI {}
