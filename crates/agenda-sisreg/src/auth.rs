//! Unit login. The CNES code doubles as the unit's password.

use crate::catalog::{Catalog, UnitRecord};
use crate::store::{keys, JsonStoreExt, LocalStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const CNES_DIGITS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Selecione uma unidade válida.")]
    UnknownUnit,
    #[error("Senha incorreta para esta unidade.")]
    InvalidPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Profile {
    Master,
    Unidade,
}

impl Profile {
    /// Landing view after login.
    pub const fn landing(self) -> &'static str {
        match self {
            Profile::Master => "dashboard-master",
            Profile::Unidade => "dashboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub unit: String,
    pub cnes: String,
    #[serde(rename = "perfil")]
    pub profile: Profile,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_master(&self) -> bool {
        self.profile == Profile::Master
    }
}

pub struct Authenticator<'a> {
    catalog: &'a Catalog,
    ttl: Duration,
}

impl<'a> Authenticator<'a> {
    pub fn new(catalog: &'a Catalog, ttl: Duration) -> Self {
        Self { catalog, ttl }
    }

    pub fn login(
        &self,
        unit_name: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, LoginError> {
        let unit = self
            .catalog
            .unit(unit_name.trim())
            .ok_or(LoginError::UnknownUnit)?;

        if pad_cnes(password.trim()) != pad_cnes(unit.cnes.trim()) {
            return Err(LoginError::InvalidPassword);
        }

        let session = new_session(unit, now + self.ttl);
        info!(unit = %session.unit, profile = ?session.profile, "login accepted");
        Ok(session)
    }
}

fn new_session(unit: &UnitRecord, expires_at: DateTime<Utc>) -> Session {
    Session {
        token: Uuid::new_v4().to_string(),
        unit: unit.name.clone(),
        cnes: unit.cnes.clone(),
        profile: if unit.is_master() {
            Profile::Master
        } else {
            Profile::Unidade
        },
        expires_at,
    }
}

/// CNES codes are seven digits; shorter numeric input is zero-padded.
fn pad_cnes(code: &str) -> String {
    if !code.is_empty() && code.len() < CNES_DIGITS && code.chars().all(|c| c.is_ascii_digit())
    {
        format!("{code:0>width$}", width = CNES_DIGITS)
    } else {
        code.to_string()
    }
}

/// Session and selected-unit persistence.
pub struct SessionStore<'a> {
    store: &'a dyn LocalStore,
    default_unit: String,
}

impl<'a> SessionStore<'a> {
    pub fn new(store: &'a dyn LocalStore, default_unit: impl Into<String>) -> Self {
        Self {
            store,
            default_unit: default_unit.into(),
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.store.save_json(keys::SESSION, session)?;
        self.store.set(keys::SELECTED_UNIT, &session.unit)?;
        self.store.set(keys::SELECTED_CNES, &session.cnes)
    }

    /// The stored session, unless it has expired.
    pub fn current(&self, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let session: Option<Session> = self.store.load_json(keys::SESSION, None)?;
        Ok(session.filter(|session| !session.is_expired(now)))
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(keys::SESSION)
    }

    pub fn active_unit(&self) -> Result<String, StoreError> {
        Ok(self
            .store
            .get(keys::SELECTED_UNIT)?
            .filter(|unit| !unit.trim().is_empty())
            .unwrap_or_else(|| self.default_unit.clone()))
    }

    pub fn active_cnes(&self) -> Result<String, StoreError> {
        Ok(self.store.get(keys::SELECTED_CNES)?.unwrap_or_default())
    }
}
