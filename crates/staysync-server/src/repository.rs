//! Read repositories for properties and bookings.
//!
//! The marketplace owns these stores; the server only reads them. The
//! bundled [`InMemoryStore`] is seeded from a JSON file and backs both the
//! binary and the tests.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use staysync_core::{BookingRecord, Property, PropertyId};
use staysync_feeds::BoxFuture;
use thiserror::Error;
use tracing::debug;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised by a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store could not answer.
    #[error("{operation} failed: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    /// Seed data could not be read or parsed.
    #[error("invalid seed data in {path}: {message}")]
    Seed { path: String, message: String },
}

impl RepositoryError {
    pub fn unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            operation,
            message: message.into(),
        }
    }
}

/// Property lookup.
pub trait PropertyRepository: Send + Sync {
    /// Returns the property, or `None` if it does not exist.
    fn get_property(&self, id: PropertyId) -> BoxFuture<'_, RepositoryResult<Option<Property>>>;
}

/// Booking lookup.
pub trait BookingRepository: Send + Sync {
    /// Returns every booking of the property, whatever its status.
    fn list_bookings_for_property(
        &self,
        property_id: PropertyId,
    ) -> BoxFuture<'_, RepositoryResult<Vec<BookingRecord>>>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedData {
    properties: Vec<Property>,
    bookings: Vec<BookingRecord>,
}

/// Properties and bookings held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    properties: HashMap<PropertyId, Property>,
    bookings: Vec<BookingRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.insert(property.id, property);
        self
    }

    pub fn with_booking(mut self, booking: BookingRecord) -> Self {
        self.bookings.push(booking);
        self
    }

    /// Parses `{"properties": [...], "bookings": [...]}`.
    pub fn from_json(json: &str) -> RepositoryResult<Self> {
        let seed: SeedData = serde_json::from_str(json).map_err(|e| RepositoryError::Seed {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_seed(seed))
    }

    /// Loads seed data from a JSON file.
    pub fn load(path: &Path) -> RepositoryResult<Self> {
        let seed_error = |message: String| RepositoryError::Seed {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| seed_error(e.to_string()))?;
        let seed: SeedData =
            serde_json::from_str(&content).map_err(|e| seed_error(e.to_string()))?;

        let store = Self::from_seed(seed);
        debug!(
            path = %path.display(),
            properties = store.properties.len(),
            bookings = store.bookings.len(),
            "Loaded seed data"
        );
        Ok(store)
    }

    fn from_seed(seed: SeedData) -> Self {
        let mut store = Self::new();
        for property in seed.properties {
            store = store.with_property(property);
        }
        store.bookings = seed.bookings;
        store
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

impl PropertyRepository for InMemoryStore {
    fn get_property(&self, id: PropertyId) -> BoxFuture<'_, RepositoryResult<Option<Property>>> {
        let property = self.properties.get(&id).cloned();
        Box::pin(async move { Ok(property) })
    }
}

impl BookingRepository for InMemoryStore {
    fn list_bookings_for_property(
        &self,
        property_id: PropertyId,
    ) -> BoxFuture<'_, RepositoryResult<Vec<BookingRecord>>> {
        let bookings: Vec<BookingRecord> = self
            .bookings
            .iter()
            .filter(|booking| booking.property_id == property_id)
            .cloned()
            .collect();
        Box::pin(async move { Ok(bookings) })
    }
}
