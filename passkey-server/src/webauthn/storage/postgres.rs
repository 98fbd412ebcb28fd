//! PostgreSQL storage for WebAuthn credentials
//!
//! Provides persistent storage for registered credentials. Counter updates are
//! a single conditional `UPDATE`, so concurrent assertions cannot both advance
//! the same counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use passkey_core::{CoseKey, Credential, CredentialStore, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::StorageError;

/// PostgreSQL-backed credential storage
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    /// Create a new PostgreSQL credential store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tracing::info!(max_connections, "Connected to PostgreSQL database");
        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    async fn insert(&self, credential: &Credential) -> Result<bool, StorageError> {
        let public_key = serde_json::to_value(&credential.public_key)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO webauthn_credentials
                (credential_id, user_id, public_key, algorithm, sign_count,
                 transports, aaguid, attestation_format, backup_eligible, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (credential_id) DO NOTHING
            "#,
        )
        .bind(&credential.credential_id)
        .bind(&credential.user_id)
        .bind(&public_key)
        .bind(credential.algorithm)
        .bind(i64::from(credential.sign_count))
        .bind(&credential.transports)
        .bind(credential.aaguid.as_slice())
        .bind(&credential.attestation_format)
        .bind(credential.backup_eligible)
        .bind(credential.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn get(&self, credential_id: &[u8]) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT credential_id, user_id, public_key, algorithm, sign_count,
                   transports, aaguid, attestation_format, backup_eligible, created_at
            FROM webauthn_credentials
            WHERE credential_id = $1
            "#,
        )
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(row.map(CredentialRow::into_credential).transpose()?)
    }

    async fn put(&self, credential: Credential) -> Result<(), StoreError> {
        if !self.insert(&credential).await? {
            return Err(StoreError::Duplicate);
        }
        tracing::info!(credential_id = %credential.id_b64(), "Credential stored in database");
        Ok(())
    }

    async fn update_counter(&self, credential_id: &[u8], sign_count: u32) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE webauthn_credentials
            SET sign_count = $2, last_used_at = NOW()
            WHERE credential_id = $1 AND sign_count < $2
            "#,
        )
        .bind(credential_id)
        .bind(i64::from(sign_count))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: &[u8]) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT credential_id, user_id, public_key, algorithm, sign_count,
                   transports, aaguid, attestation_format, backup_eligible, created_at
            FROM webauthn_credentials
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        rows.into_iter()
            .map(|row| row.into_credential().map_err(StoreError::from))
            .collect()
    }

    /// Check database connection health
    async fn check_health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}

/// Database row for credentials
#[derive(sqlx::FromRow)]
struct CredentialRow {
    credential_id: Vec<u8>,
    user_id: Vec<u8>,
    public_key: serde_json::Value,
    algorithm: i64,
    sign_count: i64,
    transports: Vec<String>,
    aaguid: Vec<u8>,
    attestation_format: String,
    backup_eligible: bool,
    created_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_credential(self) -> Result<Credential, StorageError> {
        let public_key: CoseKey = serde_json::from_value(self.public_key)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let sign_count = u32::try_from(self.sign_count).map_err(|_| {
            StorageError::Serialization(format!("sign_count out of range: {}", self.sign_count))
        })?;

        let aaguid: [u8; 16] = self.aaguid.as_slice().try_into().map_err(|_| {
            StorageError::Serialization(format!("aaguid has {} bytes", self.aaguid.len()))
        })?;

        Ok(Credential {
            credential_id: self.credential_id,
            user_id: self.user_id,
            public_key,
            algorithm: self.algorithm,
            sign_count,
            transports: self.transports,
            aaguid,
            attestation_format: self.attestation_format,
            backup_eligible: self.backup_eligible,
            created_at: self.created_at,
        })
    }
}

impl std::fmt::Debug for PostgresCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCredentialStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}
