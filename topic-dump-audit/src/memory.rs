//! In-memory audit sink for testing.

use std::sync::Mutex;

use async_trait::async_trait;
use topic_dump_shared::types::{AuditEventKind, AuditRecord};

use crate::{AuditSink, Result};

/// Audit sink that collects records in memory.
///
/// Use this in tests to assert on the exact sequence of events a run emitted
/// without touching the filesystem.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record seen so far, in order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of records with the given event kind.
    pub fn count_of(&self, event: AuditEventKind) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
