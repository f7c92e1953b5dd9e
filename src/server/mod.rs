mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use crate::api::API;
use crate::server::handlers::{locations, sessions};

type DynAPI = Arc<dyn API + Send + Sync>;

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) {
    let api = Arc::new(api) as DynAPI;

    let app = Router::new()
        .route("/locations", get(locations::list))
        .route("/attributes", get(locations::attributes))
        .route("/search", get(locations::search))
        .route("/sessions", post(sessions::create))
        .route("/sessions/:token", get(sessions::find))
        .route("/sessions/:token/addresses", post(sessions::add_address))
        .route(
            "/sessions/:token/route",
            post(sessions::generate_route).delete(sessions::clear_route),
        )
        .layer(Extension(api));

    tracing::info!("listening on {}", addr);

    if let Err(err) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!("server stopped: {}", err);
    }
}
