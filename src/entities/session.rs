use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::RouteResult;

/// Per-user route planning context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub selection: Vec<String>,
    pub status: Status,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Empty,
    Selecting,
    Routed { route: RouteResult },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Empty => "empty".into(),
            Self::Selecting => "selecting".into(),
            Self::Routed { route: _ } => "routed".into(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4(),
            selection: vec![],
            status: Status::Empty,
            updated_at: Utc::now(),
        }
    }

    pub fn route(&self) -> Option<&RouteResult> {
        match &self.status {
            Status::Routed { route } => Some(route),
            _ => None,
        }
    }

    /// Appends the addresses that are not yet selected, keeping their
    /// order. Returns how many were added. Adding anything moves the session
    /// back to `Selecting`, dropping a route computed for the old selection.
    #[tracing::instrument(skip(self, addresses), fields(token = %self.token))]
    pub fn select<I>(&mut self, addresses: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;

        for address in addresses {
            if !self.selection.contains(&address) {
                self.selection.push(address);
                added += 1;
            }
        }

        if added > 0 {
            self.status = Status::Selecting;
            self.updated_at = Utc::now();
        }

        added
    }

    #[tracing::instrument(skip(self), fields(token = %self.token))]
    pub fn clear(&mut self) {
        self.selection.clear();
        self.status = Status::Empty;
        self.updated_at = Utc::now();
    }

    pub fn can_route(&self) -> bool {
        match self.status {
            Status::Selecting | Status::Routed { route: _ } => !self.selection.is_empty(),
            Status::Empty => false,
        }
    }

    pub fn complete(&mut self, route: RouteResult) {
        self.status = Status::Routed { route };
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn select_never_duplicates() {
    let mut session = Session::new();

    let added = session.select(vec!["123 Main St".into(), "456 Oak Ave".into()]);
    assert_eq!(added, 2);

    let added = session.select(vec![
        "456 Oak Ave".into(),
        "789 Pine Rd".into(),
        "123 Main St".into(),
    ]);
    assert_eq!(added, 1);
    assert_eq!(
        session.selection,
        vec!["123 Main St", "456 Oak Ave", "789 Pine Rd"]
    );
    assert_eq!(session.status, Status::Selecting);
}

#[test]
fn select_nothing_keeps_status() {
    let mut session = Session::new();

    assert_eq!(session.select(vec![]), 0);
    assert_eq!(session.status, Status::Empty);
    assert!(!session.can_route());
}

#[test]
fn clear_discards_route() {
    let mut session = Session::new();
    session.select(vec!["123 Main St".into()]);
    session.complete(RouteResult {
        stops: vec![],
        path: vec![],
        legs: vec![],
    });
    assert!(session.route().is_some());

    session.clear();

    assert!(session.selection.is_empty());
    assert_eq!(session.status, Status::Empty);
    assert!(session.route().is_none());
}

#[test]
fn adding_an_address_after_routing_discards_stale_route() {
    let mut session = Session::new();
    session.select(vec!["123 Main St".into()]);
    session.complete(RouteResult {
        stops: vec![],
        path: vec![],
        legs: vec![],
    });

    session.select(vec!["123 Main St".into()]);
    assert_eq!(session.status.name(), "routed");

    session.select(vec!["456 Oak Ave".into()]);
    assert_eq!(session.status.name(), "selecting");
}
