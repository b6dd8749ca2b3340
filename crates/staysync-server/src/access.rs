//! Caller identification for the sync trigger.
//!
//! Authentication itself belongs to the marketplace. Here a configured
//! bearer token stands in for it and resolves to a [`Caller`] whose only
//! relevant capability is "may manage property N".

use std::collections::HashMap;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use staysync_core::PropertyId;
use tracing::{debug, warn};

use crate::error::{ServerError, ServerResult};

/// Marketplace role of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Guest,
}

/// One `[[access.tokens]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    /// Identity used in logs.
    pub caller: String,
    pub role: Role,
    /// Properties an owner manages. Ignored for admins.
    #[serde(default)]
    pub properties: Vec<PropertyId>,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
    pub properties: Vec<PropertyId>,
}

impl Caller {
    /// Admins manage everything; owners manage their own properties.
    pub fn can_manage(&self, property_id: PropertyId) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Owner => self.properties.contains(&property_id),
            Role::Guest => false,
        }
    }
}

/// Resolves bearer tokens to callers.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    callers: HashMap<String, Caller>,
}

impl AccessPolicy {
    pub fn from_tokens(tokens: &[AccessToken]) -> Self {
        let callers = tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Caller {
                        id: t.caller.clone(),
                        role: t.role,
                        properties: t.properties.clone(),
                    },
                )
            })
            .collect();
        Self { callers }
    }

    /// Identifies the caller from an `Authorization: Bearer` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> ServerResult<&Caller> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))
            })
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ServerError::Unauthenticated)?;

        self.callers.get(token).ok_or_else(|| {
            debug!("Unknown bearer token");
            ServerError::Unauthenticated
        })
    }

    /// Authenticates and checks the caller may manage `property_id`.
    pub fn authorize(&self, headers: &HeaderMap, property_id: PropertyId) -> ServerResult<&Caller> {
        let caller = self.authenticate(headers)?;
        if !caller.can_manage(property_id) {
            warn!(caller = %caller.id, property_id, "Caller may not manage property");
            return Err(ServerError::Forbidden);
        }
        Ok(caller)
    }
}
