use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Links an authenticated identity to the farm it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub farm_id: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
pub struct UserDao {
    uid: String,
    farm_id: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserDao> for UserRecord {
    fn from(val: UserDao) -> Self {
        UserRecord {
            uid: val.uid,
            farm_id: val.farm_id,
            email: val.email,
            created_at: val.created_at,
        }
    }
}

/// Keeps `created_at` of an existing row, only farm and email change.
pub async fn upsert(conn: &sqlx::PgPool, record: &UserRecord) -> Result<(), StoreError> {
    sql_stmnt!(
        r#"INSERT INTO users (uid, farm_id, email, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (uid) DO UPDATE SET
                farm_id = EXCLUDED.farm_id,
                email = COALESCE(EXCLUDED.email, users.email)"#,
        &record.uid,
        &record.farm_id,
        &record.email,
        record.created_at
    )
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get(conn: &sqlx::PgPool, uid: &str) -> Result<Option<UserDao>, StoreError> {
    Ok(sql_stmnt!(
        UserDao,
        r#"SELECT uid, farm_id, email, created_at FROM users WHERE uid = $1"#,
        uid
    )
    .fetch_optional(conn)
    .await?)
}
