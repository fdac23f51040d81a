//! Application state and sub-state extractors.
//!
//! AppState is split into sub-states so handlers can extract only what they
//! need via Axum's `FromRef`, and to avoid a single god object with duplicate
//! repositories.

use std::sync::Arc;

use sqlx::PgPool;
use tablero_core::Config;
use tablero_db::{
    AttributeDefinitionRepository, AttributeValueRepository, BlogRepository, CompanyRepository,
    FilterPreferenceRepository, IdentityRepository, ItemMediaRepository, ItemRepository,
    MemberRepository,
};
use tablero_storage::Storage;

// ----- Sub-state types -----

/// Database pool and all repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub identities: IdentityRepository,
    pub companies: CompanyRepository,
    pub members: MemberRepository,
    pub attribute_definitions: AttributeDefinitionRepository,
    pub attribute_values: AttributeValueRepository,
    pub items: ItemRepository,
    pub item_media: ItemMediaRepository,
    pub blog: BlogRepository,
    pub filter_preferences: FilterPreferenceRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            identities: IdentityRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            attribute_definitions: AttributeDefinitionRepository::new(pool.clone()),
            attribute_values: AttributeValueRepository::new(pool.clone()),
            items: ItemRepository::new(pool.clone()),
            item_media: ItemMediaRepository::new(pool.clone()),
            blog: BlogRepository::new(pool.clone()),
            filter_preferences: FilterPreferenceRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Media upload limits, resolved from Config at startup.
#[derive(Clone)]
pub struct MediaConfig {
    pub storage: Arc<dyn Storage>,
    pub max_file_size: usize,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub media: MediaConfig,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for MediaConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
