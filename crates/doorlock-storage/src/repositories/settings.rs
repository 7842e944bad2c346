use crate::error::StorageResult;
use crate::models::Setting;
use sqlx::SqlitePool;

/// Repository trait for namespaced settings
pub trait SettingsRepository: Send + Sync {
    /// Fetch one setting
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Setting>>;

    /// Insert or replace a setting value
    async fn put(&self, namespace: &str, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a setting, returning whether it existed
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool>;

    /// All settings of a namespace, ordered by key
    async fn list(&self, namespace: &str) -> StorageResult<Vec<Setting>>;
}

/// SQLite implementation of SettingsRepository
#[derive(Debug, Clone)]
pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Setting>> {
        let setting = sqlx::query_as::<_, Setting>(
            r#"
            SELECT namespace, key, value, created_at, updated_at
            FROM settings
            WHERE namespace = ? AND key = ?
            "#,
        )
        .bind(namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(setting)
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (namespace, key, value)
            VALUES (?, ?, ?)
            ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, namespace: &str) -> StorageResult<Vec<Setting>> {
        let settings = sqlx::query_as::<_, Setting>(
            r#"
            SELECT namespace, key, value, created_at, updated_at
            FROM settings
            WHERE namespace = ?
            ORDER BY key
            "#,
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn repo() -> SqliteSettingsRepository {
        let db = Database::in_memory().await.unwrap();
        SqliteSettingsRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = repo().await;
        assert!(repo.get("locksys", "password").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let repo = repo().await;
        repo.put("locksys", "password", "4321").await.unwrap();

        let setting = repo.get("locksys", "password").await.unwrap().unwrap();
        assert_eq!(setting.value, "4321");
        assert_eq!(setting.namespace, "locksys");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let repo = repo().await;
        repo.put("locksys", "password", "1111").await.unwrap();
        repo.put("locksys", "password", "2222").await.unwrap();

        let all = repo.list("locksys").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "2222");
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let repo = repo().await;
        repo.put("locksys", "password", "1111").await.unwrap();
        repo.put("other", "password", "2222").await.unwrap();

        assert_eq!(
            repo.get("other", "password").await.unwrap().unwrap().value,
            "2222"
        );
        assert_eq!(repo.list("locksys").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        repo.put("locksys", "password", "1111").await.unwrap();

        assert!(repo.delete("locksys", "password").await.unwrap());
        assert!(!repo.delete("locksys", "password").await.unwrap());
        assert!(repo.get("locksys", "password").await.unwrap().is_none());
    }
}
