//! Runtime configuration, read from environment variables over built-in defaults.

use std::{fmt, str::FromStr};

use tracker_core::document::{DocumentExt, DocumentKey};

use crate::{
    dispatcher::CrudPlan,
    patient::{PATIENT_COLLECTION, Patient},
    repository::DocumentTarget,
};

pub const BACKEND_VAR: &str = "TRACKER_BACKEND";
pub const MONGODB_URI_VAR: &str = "TRACKER_MONGODB_URI";
pub const MONGODB_DATABASE_VAR: &str = "TRACKER_MONGODB_DATABASE";
pub const COLLECTION_VAR: &str = "TRACKER_COLLECTION";
pub const SEED_FIXTURES_VAR: &str = "TRACKER_SEED_FIXTURES";
pub const UPDATE_KEY_VAR: &str = "TRACKER_UPDATE_KEY";
pub const DELETE_KEY_VAR: &str = "TRACKER_DELETE_KEY";
pub const READ_KEY_VAR: &str = "TRACKER_READ_KEY";
/// Optional JSON object describing the patient the create operation stores.
pub const NEW_PATIENT_VAR: &str = "TRACKER_NEW_PATIENT";

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
const DEFAULT_MONGODB_DATABASE: &str = "patient-tracker";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown backend '{0}', expected 'memory' or 'mongodb'")]
    UnknownBackend(String),
    #[error("Invalid boolean '{value}' for {var}")]
    InvalidBool { var: &'static str, value: String },
    #[error("Backend '{0}' is not available in this build")]
    BackendUnavailable(BackendKind),
    #[error("Invalid patient in {var}: {reason}")]
    InvalidPatient { var: &'static str, reason: String },
}

/// Which storage backend to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    MongoDb,
}

impl BackendKind {
    /// Whether this build was compiled with support for the backend.
    pub fn is_available(&self) -> bool {
        match self {
            BackendKind::Memory => true,
            BackendKind::MongoDb => cfg!(feature = "mongodb"),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::MongoDb => write!(f, "mongodb"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "mongodb" | "mongo" => Ok(BackendKind::MongoDb),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub backend: BackendKind,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    /// Collection the patients live in.
    pub collection: String,
    /// Write the fixture patients before running the plan.
    pub seed_fixtures: bool,
    pub plan: CrudPlan,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            mongodb_uri: DEFAULT_MONGODB_URI.to_string(),
            mongodb_database: DEFAULT_MONGODB_DATABASE.to_string(),
            collection: PATIENT_COLLECTION.to_string(),
            seed_fixtures: false,
            plan: CrudPlan::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration with priority: env vars > defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source, applying overrides on top of the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(backend) = lookup(BACKEND_VAR) {
            config.backend = backend.parse()?;
        }
        if !config.backend.is_available() {
            return Err(ConfigError::BackendUnavailable(config.backend));
        }

        if let Some(uri) = lookup(MONGODB_URI_VAR) {
            config.mongodb_uri = uri;
        }
        if let Some(database) = lookup(MONGODB_DATABASE_VAR) {
            config.mongodb_database = database;
        }
        if let Some(collection) = lookup(COLLECTION_VAR) {
            config.collection = collection;
        }
        if let Some(seed) = lookup(SEED_FIXTURES_VAR) {
            config.seed_fixtures = parse_bool(SEED_FIXTURES_VAR, &seed)?;
        }

        if let Some(key) = lookup(UPDATE_KEY_VAR) {
            config.plan.update_target = DocumentTarget::Key(DocumentKey::new(key));
        }
        if let Some(key) = lookup(DELETE_KEY_VAR) {
            config.plan.delete_target = DocumentTarget::Key(DocumentKey::new(key));
        }
        if let Some(key) = lookup(READ_KEY_VAR) {
            config.plan.read_target = DocumentTarget::Key(DocumentKey::new(key));
        }
        if let Some(json) = lookup(NEW_PATIENT_VAR) {
            config.plan.new_patient = parse_patient(&json)?;
        }

        Ok(config)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var, value: value.to_string() }),
    }
}

fn parse_patient(json: &str) -> Result<Patient, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidPatient { var: NEW_PATIENT_VAR, reason };

    let value = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
    Patient::from_json(value).map_err(|e| invalid(e.to_string()))
}
