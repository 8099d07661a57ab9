//! Extractor that serves preset values. Used by the devnet and tests.

use crate::domain::{OracleError, OracleResult};
use crate::ports::DataExtractor;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{NebulaId, Value, ValueType};
use std::collections::HashMap;

/// Extractor returning a configured value per feed.
#[derive(Debug, Default)]
pub struct FixedExtractor {
    fallback: RwLock<Option<Value>>,
    values: RwLock<HashMap<NebulaId, Value>>,
}

impl FixedExtractor {
    /// Serve `value` for every feed.
    pub fn new(value: Value) -> Self {
        Self {
            fallback: RwLock::new(Some(value)),
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the value served for every feed without an override.
    pub fn set(&self, value: Value) {
        *self.fallback.write() = Some(value);
    }

    /// Serve `value` for one feed.
    pub fn set_for(&self, nebula: NebulaId, value: Value) {
        self.values.write().insert(nebula, value);
    }
}

#[async_trait]
impl DataExtractor for FixedExtractor {
    async fn extract(&self, nebula: &NebulaId, value_type: ValueType) -> OracleResult<Value> {
        let value = self
            .values
            .read()
            .get(nebula)
            .cloned()
            .or_else(|| self.fallback.read().clone())
            .ok_or_else(|| OracleError::Extractor("no value configured".into()))?;
        if value.value_type() != value_type {
            return Err(OracleError::TypeMismatch {
                expected: value_type.to_string(),
                got: value.value_type().to_string(),
            });
        }
        Ok(value)
    }
}
