use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{api::SessionAPI, entities::Session, error::Error};

#[async_trait]
impl SessionAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_session(&self) -> Result<Session, Error> {
        let session = Session::new();

        self.insert_session(session.clone()).await;
        tracing::info!("created session {}", session.token);

        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    async fn find_session(&self, token: Uuid) -> Result<Session, Error> {
        let session = self.fetch_session(&token).await?;
        let session = session.lock().await;

        Ok(session.clone())
    }
}

#[test]
fn unknown_session_is_invalid_input() {
    use super::stub::StubRouting;
    use crate::table::AddressTable;
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = Engine::new(
        AddressTable::default(),
        Arc::new(StubRouting::default()),
        "driving-car".into(),
    );

    let err = block_on(engine.find_session(Uuid::new_v4())).unwrap_err();
    assert_eq!(err.code, 101);

    let session = block_on(engine.create_session()).unwrap();
    let found = block_on(engine.find_session(session.token)).unwrap();
    assert_eq!(found.token, session.token);
    assert!(found.selection.is_empty());
}
