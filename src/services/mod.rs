//! Business logic services

pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod librarians;
pub mod members;
pub mod policy;
pub mod stats;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, CirculationConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub librarians: librarians::LibrariansService,
    pub members: members::MembersService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, circulation_config: &CirculationConfig) -> Self {
        let policy = policy::CirculationPolicy::from_config(circulation_config);
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(Arc::new(repository.circulation.clone()), policy),
            librarians: librarians::LibrariansService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
