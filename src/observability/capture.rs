//! In-memory backend.
//!
//! Keeps every emitted record so callers (mostly tests) can assert on what a
//! request produced. Level filtering follows the configured settings like any
//! other backend.

use std::sync::{Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde_json::Value;

use super::backend::{BackendSettings, Field, Level, LogBackend, Record};

/// An owned copy of an emitted record.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub level: Level,
    pub message: String,
    pub fields: Vec<Field>,
}

impl CapturedRecord {
    /// Last value recorded under `key`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().rev().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Every value recorded under `key`, in order.
    pub fn values(&self, key: &str) -> Vec<&Value> {
        self.fields
            .iter()
            .filter(|f| f.key == key)
            .map(|f| &f.value)
            .collect()
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }
}

/// Backend that stores records in memory.
#[derive(Debug, Default)]
pub struct CaptureBackend {
    settings: ArcSwap<BackendSettings>,
    records: Mutex<Vec<CapturedRecord>>,
}

impl CaptureBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records emitted so far.
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current settings, as last pushed by `configure`.
    pub fn settings(&self) -> BackendSettings {
        BackendSettings::clone(&self.settings.load())
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogBackend for CaptureBackend {
    fn emit(&self, record: &Record<'_>) {
        if !self.settings.load().level.allows(record.level) {
            return;
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedRecord {
                level: record.level,
                message: record.message.to_string(),
                fields: record.fields.to_vec(),
            });
    }

    fn configure(&self, settings: BackendSettings) {
        self.settings.store(settings.into());
    }
}
