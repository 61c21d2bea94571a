//! In-memory store backing, used by the default binary and by tests.
//!
//! `DashMap` gives the same safe-for-concurrent-reuse property the process-wide
//! store handle needs: one instance is created lazily at startup and shared
//! across all request invocations behind an `Arc`.

use crate::connections;
use crate::error::{Error, StoreErrorKind};
use crate::incidents;
use crate::users;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct InMemoryStore {
    users: DashMap<String, users::Model>,
    incidents: DashMap<String, incidents::Model>,
    connections: DashMap<String, connections::Model>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl users::UserStore for InMemoryStore {
    async fn insert_new(&self, user: users::Model) -> Result<users::Model, Error> {
        let duplicate = self.users.iter().any(|entry| {
            entry.value().email == user.email || entry.value().username == user.username
        });
        if duplicate {
            return Err(Error::new(StoreErrorKind::RecordConflict));
        }
        match self.users.entry(user.user_id.clone()) {
            Entry::Occupied(_) => Err(Error::new(StoreErrorKind::RecordConflict)),
            Entry::Vacant(vacant) => {
                vacant.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<users::Model>, Error> {
        // Email match wins over a username match when both exist.
        let mut by_username = None;
        for entry in self.users.iter() {
            if entry.value().email == identifier {
                return Ok(Some(entry.value().clone()));
            }
            if entry.value().username == identifier && by_username.is_none() {
                by_username = Some(entry.value().clone());
            }
        }
        Ok(by_username)
    }
}

#[async_trait]
impl incidents::IncidentStore for InMemoryStore {
    async fn insert_new(&self, incident: incidents::Model) -> Result<incidents::Model, Error> {
        match self.incidents.entry(incident.incident_id.clone()) {
            Entry::Occupied(_) => Err(Error::new(StoreErrorKind::RecordConflict)),
            Entry::Vacant(vacant) => {
                vacant.insert(incident.clone());
                Ok(incident)
            }
        }
    }

    async fn get(&self, incident_id: &str) -> Result<Option<incidents::Model>, Error> {
        Ok(self.incidents.get(incident_id).map(|e| e.value().clone()))
    }

    async fn update(&self, incident: incidents::Model) -> Result<incidents::Model, Error> {
        match self.incidents.entry(incident.incident_id.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(incident.clone());
                Ok(incident)
            }
            Entry::Vacant(_) => Err(Error::new(StoreErrorKind::RecordNotFound)),
        }
    }

    async fn scan(&self) -> Result<Vec<incidents::Model>, Error> {
        Ok(self.incidents.iter().map(|e| e.value().clone()).collect())
    }
}

#[async_trait]
impl connections::ConnectionStore for InMemoryStore {
    async fn put(&self, connection: connections::Model) -> Result<(), Error> {
        self.connections
            .insert(connection.connection_id.clone(), connection);
        Ok(())
    }

    async fn remove(&self, connection_id: &str) -> Result<(), Error> {
        self.connections.remove(connection_id);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<connections::Model>, Error> {
        Ok(self.connections.iter().map(|e| e.value().clone()).collect())
    }
}
