use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One row of the `settings` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Setting {
    pub namespace: String,
    pub key: String,
    #[serde(skip)]
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
