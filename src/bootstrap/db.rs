//! Platform database access for the bootstrap pass
//!
//! A thin typed layer over one PostgreSQL pool, restricted to the rows the
//! bootstrap touches: the privileged user, its personal project and
//! ownership link, the setup flag, the service API key, and credential
//! rows with their project shares. Column names follow the platform's
//! camelCase schema, quoted where needed.

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

/// Typed handle over the platform database
pub struct PlatformDb {
    pool: PgPool,
}

impl PlatformDb {
    /// Connect with a small pool; the bootstrap is a single sequential pass
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await
            .context("Failed to connect to platform database")?;
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    pub async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>> {
        let row = sqlx::query(r#"SELECT id FROM "user" WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("id")))
    }

    pub async fn insert_owner_user(
        &self,
        user_id: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO "user"
               (id, email, "firstName", "lastName", password, "roleSlug",
                "personalizationAnswers", "createdAt", "updatedAt", disabled)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(user_id)
        .bind(email)
        .bind("Admin")
        .bind("User")
        .bind(password_hash)
        .bind("global:owner")
        .bind(Option::<String>::None)
        .bind(now)
        .bind(now)
        .bind(false)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_personal_project(
        &self,
        project_id: &str,
        name: &str,
        creator_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO project (id, name, type, "createdAt", "updatedAt", "creatorId")
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(project_id)
        .bind(name)
        .bind("personal")
        .bind(now)
        .bind(now)
        .bind(creator_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_project_relation(
        &self,
        project_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO project_relation
               ("projectId", "userId", role, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind("project:personalOwner")
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Idempotent: runs on every bootstrap, flipping the setup wizard off
    pub async fn mark_setup_complete(&self) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO settings (key, value, "loadOnStartup")
               VALUES ('userManagement.isInstanceOwnerSetUp', '"true"', true)
               ON CONFLICT (key) DO UPDATE SET value = '"true"'"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_api_key(&self, key_id: &str) -> Result<Option<String>> {
        let row = sqlx::query(r#"SELECT "apiKey" FROM user_api_keys WHERE id = $1"#)
            .bind(key_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("apiKey")))
    }

    pub async fn insert_api_key(
        &self,
        key_id: &str,
        user_id: &str,
        label: &str,
        api_key: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO user_api_keys
               (id, "userId", label, "apiKey", "createdAt", "updatedAt", scopes, audience)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(key_id)
        .bind(user_id)
        .bind(label)
        .bind(api_key)
        .bind(now)
        .bind(now)
        .bind(r#"["credentials:read"]"#)
        .bind("public-api")
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// First available project, usually the owner's personal one
    pub async fn first_project_id(&self) -> Result<Option<String>> {
        let row = sqlx::query("SELECT id FROM project LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("id")))
    }

    pub async fn find_credential_id(&self, name: &str, r#type: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT id FROM credentials_entity WHERE name = $1 AND type = $2")
            .bind(name)
            .bind(r#type)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("id")))
    }

    pub async fn update_credential_data(
        &self,
        credential_id: &str,
        encrypted_data: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(r#"UPDATE credentials_entity SET data = $1, "updatedAt" = $2 WHERE id = $3"#)
            .bind(encrypted_data)
            .bind(now)
            .bind(credential_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_credential(
        &self,
        credential_id: &str,
        name: &str,
        r#type: &str,
        encrypted_data: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO credentials_entity (id, name, type, data, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(credential_id)
        .bind(name)
        .bind(r#type)
        .bind(encrypted_data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn share_credential(
        &self,
        credential_id: &str,
        project_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO shared_credentials
               ("credentialsId", "projectId", role, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT ("credentialsId", "projectId") DO NOTHING"#,
        )
        .bind(credential_id)
        .bind(project_id)
        .bind("credential:owner")
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
