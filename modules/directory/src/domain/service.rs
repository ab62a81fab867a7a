use chrono::Utc;
use rand::Rng;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::DirectoryConfig;
use crate::contract::model::{User, UserProfile};
use crate::domain::error::DomainError;
use crate::infra::storage::{entity, mapper::entity_to_contract};

/// Domain service for the user directory.
pub struct Service {
    db: DatabaseConnection,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_search_results: u64,
    pub max_full_name_length: usize,
    pub avatar_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        DirectoryConfig::default().into()
    }
}

impl From<DirectoryConfig> for ServiceConfig {
    fn from(cfg: DirectoryConfig) -> Self {
        Self {
            max_search_results: cfg.max_search_results,
            max_full_name_length: cfg.max_full_name_length,
            avatar_base_url: cfg.avatar_base_url,
        }
    }
}

impl Service {
    pub fn new(db: DatabaseConnection, config: ServiceConfig) -> Self {
        Self { db, config }
    }

    #[instrument(name = "directory.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.find_user(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(entity::find_by_id(&self.db, id)
            .await?
            .map(entity_to_contract))
    }

    #[instrument(name = "directory.service.find_many", skip(self, ids), fields(requested = ids.len()))]
    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let users = entity::find_many_by_ids(&self.db, &unique).await?;
        debug!(found = users.len(), "Resolved users by id");
        Ok(users.into_iter().map(entity_to_contract).collect())
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(entity::exists_by_id(&self.db, id).await?)
    }

    /// Create the profile on first call, update it afterwards.
    #[instrument(name = "directory.service.upsert_profile", skip(self, profile), fields(user_id = %id))]
    pub async fn upsert_profile(&self, id: Uuid, profile: UserProfile) -> Result<User, DomainError> {
        let email = normalize_email(&profile.email);
        if !is_valid_email(&email) {
            return Err(DomainError::invalid_email(profile.email));
        }
        let full_name = self.validate_full_name(&profile.full_name)?;
        let profile_pic = match profile.profile_pic.as_deref().map(str::trim) {
            Some("") => return Err(DomainError::validation("profilePic", "must not be blank")),
            other => other.map(str::to_owned),
        };

        if let Some(holder) = entity::find_by_email(&self.db, &email).await? {
            if holder.id != id {
                return Err(DomainError::email_already_exists(email));
            }
        }

        let now = Utc::now();
        let claimed = email.clone();
        let saved = match entity::find_by_id(&self.db, id).await? {
            Some(existing) => {
                let update = entity::UpdateUserEntity {
                    email,
                    full_name,
                    profile_pic: profile_pic.unwrap_or(existing.profile_pic),
                    updated_at: now.max(existing.updated_at),
                };
                entity::update(&self.db, id, update)
                    .await
                    .map_err(|e| DomainError::from_profile_write(e, &claimed))?
            }
            None => {
                let new_user = entity::NewUserEntity {
                    id,
                    email,
                    full_name,
                    profile_pic: profile_pic.unwrap_or_else(|| self.random_avatar()),
                    created_at: now,
                    updated_at: now,
                };
                let created = entity::create(&self.db, new_user)
                    .await
                    .map_err(|e| DomainError::from_profile_write(e, &claimed))?;
                info!("Created directory profile");
                created
            }
        };

        Ok(entity_to_contract(saved))
    }

    #[instrument(name = "directory.service.search_by_email", skip(self))]
    pub async fn search_by_email(&self, keyword: &str) -> Result<Vec<User>, DomainError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(DomainError::validation("keyword", "keyword is required"));
        }

        let users =
            entity::search_by_email(&self.db, &keyword.to_lowercase(), self.config.max_search_results)
                .await?;
        Ok(users.into_iter().map(entity_to_contract).collect())
    }

    fn validate_full_name(&self, raw: &str) -> Result<String, DomainError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::EmptyFullName);
        }
        let len = name.chars().count();
        if len > self.config.max_full_name_length {
            return Err(DomainError::full_name_too_long(
                len,
                self.config.max_full_name_length,
            ));
        }
        Ok(name.to_owned())
    }

    fn random_avatar(&self) -> String {
        let n: u32 = rand::rng().random_range(1..=100);
        format!("{}/{}.png", self.config.avatar_base_url.trim_end_matches('/'), n)
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+tag@mail.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "plain",
            "@example.com",
            "ana@",
            "ana@example",
            "ana@.com",
            "ana@example.",
            "ana@@example.com",
            "ana smith@example.com",
        ] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
