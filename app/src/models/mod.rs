use crate::error::StoreError;
use chrono::{DateTime, Utc};
use elacare_core::{SensorHistoryRecord, SensorSnapshot};
use tracing::{info, warn};

macro_rules! sql_stmnt {
    ($ret:ident, $stmt:expr) => {
        sqlx::query_as::<_ ,$ret>($stmt)
    };
    ($stmt:expr) => {
        sqlx::query($stmt)
    };
    ($ret:ident, $stmt:expr, $($bind:expr),*) => {
        sqlx::query_as::<_ ,$ret>($stmt)$(.bind($bind))*
    };
    ($stmt:expr, $($bind:expr),*) => {
        sqlx::query($stmt)$(.bind($bind))*
    };
}

pub mod alert;
pub mod farm;
pub mod history;
pub mod memory;
pub mod snapshot;
pub mod user;

pub use alert::{Alert, NewAlert};
pub use farm::{FarmConfig, SensorToggles};
pub use history::HistoryQuery;
pub use memory::MemoryStore;
pub use user::UserRecord;

/// Persistence behind the API. Postgres when a database url is configured,
/// otherwise a process-local store with the same semantics.
pub enum Datastore {
    Postgres(sqlx::PgPool),
    Memory(MemoryStore),
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Datastore::Postgres(_) => f.write_str("Datastore::Postgres"),
            Datastore::Memory(_) => f.write_str("Datastore::Memory"),
        }
    }
}

pub async fn establish_datastore(database_url: Option<&str>) -> Result<Datastore, StoreError> {
    match database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new().connect(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Connected to postgres, schema is up to date");
            Ok(Datastore::Postgres(pool))
        }
        None => {
            warn!("DATABASE_URL not set, falling back to the in-memory store");
            Ok(Datastore::Memory(MemoryStore::default()))
        }
    }
}

impl Datastore {
    pub async fn put_current(
        &self,
        farm_id: &str,
        snapshot: &SensorSnapshot,
    ) -> Result<(), StoreError> {
        match self {
            Datastore::Postgres(conn) => snapshot::upsert(conn, farm_id, snapshot).await,
            Datastore::Memory(store) => {
                store.put_current(farm_id, snapshot);
                Ok(())
            }
        }
    }

    pub async fn append_history(
        &self,
        farm_id: &str,
        snapshot: &SensorSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Result<SensorHistoryRecord, StoreError> {
        match self {
            Datastore::Postgres(conn) => history::insert(conn, farm_id, snapshot, timestamp).await,
            Datastore::Memory(store) => Ok(store.append_history(farm_id, snapshot, timestamp)),
        }
    }

    pub async fn current(&self, farm_id: &str) -> Result<Option<SensorSnapshot>, StoreError> {
        match self {
            Datastore::Postgres(conn) => {
                Ok(snapshot::get(conn, farm_id).await?.map(SensorSnapshot::from))
            }
            Datastore::Memory(store) => Ok(store.current(farm_id)),
        }
    }

    pub async fn history(
        &self,
        farm_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<SensorHistoryRecord>, StoreError> {
        match self {
            Datastore::Postgres(conn) => history::get(conn, farm_id, query).await,
            Datastore::Memory(store) => Ok(store.history(farm_id, query)),
        }
    }

    pub async fn farm(&self, farm_id: &str) -> Result<Option<FarmConfig>, StoreError> {
        match self {
            Datastore::Postgres(conn) => Ok(farm::get(conn, farm_id).await?.map(FarmConfig::from)),
            Datastore::Memory(store) => Ok(store.farm(farm_id)),
        }
    }

    pub async fn upsert_farm(&self, config: &FarmConfig) -> Result<(), StoreError> {
        match self {
            Datastore::Postgres(conn) => farm::upsert(conn, config).await,
            Datastore::Memory(store) => {
                store.upsert_farm(config);
                Ok(())
            }
        }
    }

    pub async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        match self {
            Datastore::Postgres(conn) => alert::insert(conn, alert).await,
            Datastore::Memory(store) => Ok(store.insert_alert(alert)),
        }
    }

    pub async fn user(&self, uid: &str) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Datastore::Postgres(conn) => Ok(user::get(conn, uid).await?.map(UserRecord::from)),
            Datastore::Memory(store) => Ok(store.user(uid)),
        }
    }

    pub async fn upsert_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        match self {
            Datastore::Postgres(conn) => user::upsert(conn, record).await,
            Datastore::Memory(store) => {
                store.upsert_user(record);
                Ok(())
            }
        }
    }

    /// Human readable backend state for the health endpoint.
    pub async fn check(&self) -> String {
        match self {
            Datastore::Postgres(conn) => match sql_stmnt!("SELECT 1").execute(conn).await {
                Ok(_) => "connected".to_owned(),
                Err(err) => format!("error: {}", err),
            },
            Datastore::Memory(_) => "memory".to_owned(),
        }
    }
}

#[cfg(test)]
mod test;
