use super::Engine;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    entities::Session,
    error::{invalid_input_error, Error},
};

impl Engine {
    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_session(&self, token: &Uuid) -> Result<Arc<Mutex<Session>>, Error> {
        let mut sessions = self.sessions.lock().await;
        self.evict_idle_sessions(&mut sessions);

        sessions.get(token).cloned().ok_or_else(|| {
            tracing::info!("no session for token");
            invalid_input_error()
        })
    }

    pub(super) async fn insert_session(&self, session: Session) {
        let mut sessions = self.sessions.lock().await;
        self.evict_idle_sessions(&mut sessions);

        sessions.insert(session.token, Arc::new(Mutex::new(session)));
    }

    /// Drops sessions not updated within the TTL. Sessions locked by a
    /// running action are kept.
    fn evict_idle_sessions(&self, sessions: &mut HashMap<Uuid, Arc<Mutex<Session>>>) {
        let cutoff = Utc::now() - self.session_ttl;
        let before = sessions.len();

        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => session.updated_at > cutoff,
            Err(_) => true,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!("evicted {} idle sessions", evicted);
        }
    }
}

#[cfg(test)]
fn engine_with_ttl(ttl: chrono::Duration) -> Engine {
    use super::stub::StubRouting;
    use crate::table::AddressTable;

    Engine::new(
        AddressTable::default(),
        Arc::new(StubRouting::default()),
        "driving-car".into(),
    )
    .with_session_ttl(ttl)
}

#[test]
fn idle_sessions_are_evicted() {
    use crate::api::{RouteAPI, SessionAPI};
    use tokio_test::block_on;

    let engine = engine_with_ttl(chrono::Duration::minutes(30));

    let idle = block_on(engine.create_session()).unwrap().token;
    let active = block_on(engine.create_session()).unwrap().token;

    let session = block_on(engine.fetch_session(&idle)).unwrap();
    block_on(session.lock()).updated_at = Utc::now() - chrono::Duration::hours(2);

    block_on(engine.clear_route(active)).unwrap();
    assert_eq!(block_on(engine.sessions.lock()).len(), 1);

    let err = block_on(engine.find_session(idle)).unwrap_err();
    assert_eq!(err.code, 101);
    assert!(block_on(engine.find_session(active)).is_ok());
}

