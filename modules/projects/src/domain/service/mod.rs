//! Domain service for projects, tasks and comments.
//!
//! Each operation loads the state it needs, asks one predicate from
//! [`crate::domain::access`] whether the actor may proceed, then validates and
//! persists. Nothing is cached between calls.

mod comments;
mod projects;
mod tasks;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::ProjectsConfig;
use crate::contract::model::{Project, Task};
use crate::domain::error::DomainError;
use crate::domain::events::ProjectDomainEvent;
use crate::domain::membership::MembershipSet;
use crate::domain::ports::{EventPublisher, UserDirectory};
use crate::domain::repo::ProjectsRepository;

#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn ProjectsRepository>,
    directory: Arc<dyn UserDirectory>,
    events: Arc<dyn EventPublisher<ProjectDomainEvent>>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_title_length: usize,
    pub max_description_length: usize,
    pub max_comment_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ProjectsConfig::default().into()
    }
}

impl From<ProjectsConfig> for ServiceConfig {
    fn from(cfg: ProjectsConfig) -> Self {
        Self {
            max_title_length: cfg.max_title_length,
            max_description_length: cfg.max_description_length,
            max_comment_length: cfg.max_comment_length,
        }
    }
}

impl Service {
    pub fn new(
        repo: Arc<dyn ProjectsRepository>,
        directory: Arc<dyn UserDirectory>,
        events: Arc<dyn EventPublisher<ProjectDomainEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            directory,
            events,
            config,
        }
    }

    async fn load_project(&self, id: Uuid) -> Result<(Project, MembershipSet), DomainError> {
        let project = self
            .repo
            .find_project(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::project_not_found(id))?;
        let set = MembershipSet::restore(project.members.clone());
        Ok((project, set))
    }

    async fn load_task(&self, id: Uuid) -> Result<Task, DomainError> {
        self.repo
            .find_task(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::task_not_found(id))
    }

    /// Trimmed, non-empty, at most `max_title_length` characters.
    fn clean_title(&self, raw: &str) -> Result<String, DomainError> {
        let title = raw.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if title.chars().count() > self.config.max_title_length {
            return Err(DomainError::validation(
                "title",
                format!("must be at most {} characters", self.config.max_title_length),
            ));
        }
        Ok(title.to_owned())
    }

    fn clean_description(&self, raw: Option<&str>) -> Result<String, DomainError> {
        let description = raw.map(str::trim).unwrap_or_default();
        if description.chars().count() > self.config.max_description_length {
            return Err(DomainError::validation(
                "description",
                format!(
                    "must be at most {} characters",
                    self.config.max_description_length
                ),
            ));
        }
        Ok(description.to_owned())
    }

    fn clean_comment(&self, raw: &str) -> Result<String, DomainError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(DomainError::validation("text", "must not be empty"));
        }
        if text.chars().count() > self.config.max_comment_length {
            return Err(DomainError::validation(
                "text",
                format!("must be at most {} characters", self.config.max_comment_length),
            ));
        }
        Ok(text.to_owned())
    }
}

fn storage(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

/// `updated_at` for a write: never equal to or behind the previous value.
fn advance(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > prev {
        now
    } else {
        prev + chrono::Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_past_future_timestamps() {
        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(advance(future) > future);

        let past = Utc::now() - chrono::Duration::hours(1);
        assert!(advance(past) > past);
    }
}
