use super::{Alert, FarmConfig, HistoryQuery, NewAlert, UserRecord};
use chrono::{DateTime, Utc};
use elacare_core::{SensorHistoryRecord, SensorSnapshot};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    current: HashMap<String, SensorSnapshot>,
    history: HashMap<String, Vec<SensorHistoryRecord>>,
    farms: HashMap<String, FarmConfig>,
    alerts: Vec<Alert>,
    users: HashMap<String, UserRecord>,
}

/// Process-local datastore, lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn put_current(&self, farm_id: &str, snapshot: &SensorSnapshot) {
        self.tables
            .write()
            .current
            .insert(farm_id.to_owned(), snapshot.clone());
    }

    pub fn append_history(
        &self,
        farm_id: &str,
        snapshot: &SensorSnapshot,
        timestamp: DateTime<Utc>,
    ) -> SensorHistoryRecord {
        let record = SensorHistoryRecord {
            id: Uuid::new_v4().to_string(),
            snapshot: snapshot.clone(),
            timestamp,
        };
        self.tables
            .write()
            .history
            .entry(farm_id.to_owned())
            .or_default()
            .push(record.clone());
        record
    }

    pub fn current(&self, farm_id: &str) -> Option<SensorSnapshot> {
        self.tables.read().current.get(farm_id).cloned()
    }

    pub fn history(&self, farm_id: &str, query: &HistoryQuery) -> Vec<SensorHistoryRecord> {
        let tables = self.tables.read();
        let mut records: Vec<SensorHistoryRecord> = tables
            .history
            .get(farm_id)
            .map(|records| {
                records
                    .iter()
                    .rev()
                    .filter(|record| query.matches(&record.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(query.limit.max(0) as usize);
        records
    }

    pub fn farm(&self, farm_id: &str) -> Option<FarmConfig> {
        self.tables.read().farms.get(farm_id).cloned()
    }

    pub fn upsert_farm(&self, config: &FarmConfig) {
        self.tables
            .write()
            .farms
            .insert(config.farm_id.clone(), config.clone());
    }

    pub fn insert_alert(&self, alert: NewAlert) -> Alert {
        let alert = alert.into_alert(Uuid::new_v4(), Utc::now());
        self.tables.write().alerts.push(alert.clone());
        alert
    }

    #[cfg(test)]
    pub fn alerts(&self, farm_id: &str) -> Vec<Alert> {
        self.tables
            .read()
            .alerts
            .iter()
            .filter(|alert| alert.farm_id == farm_id)
            .cloned()
            .collect()
    }

    pub fn user(&self, uid: &str) -> Option<UserRecord> {
        self.tables.read().users.get(uid).cloned()
    }

    pub fn upsert_user(&self, record: &UserRecord) {
        match self.tables.write().users.entry(record.uid.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.farm_id = record.farm_id.clone();
                if record.email.is_some() {
                    existing.email = record.email.clone();
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
            }
        }
    }
}
