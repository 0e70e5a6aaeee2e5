use chrono::Duration;
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{ItemRecord, ProcessedCommand};

#[derive(Debug)]
pub struct Tables {
    pub items: HashMap<i64, ItemRecord>,
    pub processed_commands: HashMap<String, ProcessedCommand>,
    next_bid_id: i64,
    command_retention: Duration,
    max_processed_commands: usize,
}

impl Tables {
    pub fn item(&self, item_id: i64) -> ServiceResult<&ItemRecord> {
        self.items
            .get(&item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Item {}", item_id)))
    }

    pub fn item_mut(&mut self, item_id: i64) -> ServiceResult<&mut ItemRecord> {
        self.items
            .get_mut(&item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Item {}", item_id)))
    }

    pub fn allocate_bid_id(&mut self) -> i64 {
        self.next_bid_id += 1;
        self.next_bid_id
    }

    /// Caches a reply for replay. Entries older than the retention window are
    /// dropped, and the oldest one goes when the table is full.
    pub fn record_processed(&mut self, processed: ProcessedCommand) {
        let cutoff = processed.processed_at - self.command_retention;
        self.processed_commands
            .retain(|_, entry| entry.processed_at >= cutoff);

        if self.processed_commands.len() >= self.max_processed_commands {
            let oldest = self
                .processed_commands
                .iter()
                .min_by_key(|(_, entry)| entry.processed_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                self.processed_commands.remove(&key);
            }
        }
        self.processed_commands
            .insert(processed.idempotency_key.clone(), processed);
    }
}

pub const COMMAND_RETENTION_HOURS: i64 = 24;
pub const MAX_PROCESSED_COMMANDS: usize = 10_000;

/// In-memory item tables. Every mutation holds the single lock for its whole
/// read-check-write cycle, so each one is atomic.
#[derive(Debug)]
pub struct ItemStore {
    tables: Mutex<Tables>,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self::with_command_limits(
            Duration::hours(COMMAND_RETENTION_HOURS),
            MAX_PROCESSED_COMMANDS,
        )
    }

    pub fn with_command_limits(retention: Duration, max_processed_commands: usize) -> Self {
        Self {
            tables: Mutex::new(Tables {
                items: HashMap::new(),
                processed_commands: HashMap::new(),
                next_bid_id: 0,
                command_retention: retention,
                max_processed_commands: max_processed_commands.max(1),
            }),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().await
    }

    /// Runs `f` against a copy of the record and commits only on success.
    pub async fn update<T>(
        &self,
        item_id: i64,
        f: impl FnOnce(&mut ItemRecord, &mut Tables) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let mut tables = self.lock().await;
        let mut staged = tables.item(item_id)?.clone();
        let result = f(&mut staged, &mut *tables)?;
        tables.items.insert(item_id, staged);
        Ok(result)
    }
}
