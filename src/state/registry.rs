use crate::config::{Config, SettingsHandle};
use crate::db::Db;
use crate::db::repo::{BalanceRepo, BalanceRepository, CatalogRepo, CatalogRepository, MemoryStore};
use crate::db::repo::{ChatRepo, ChatRepository, InventoryRepo, InventoryRepository, TotalsRepo, TotalsRepository};
use crate::net::{ChatClient, RetryingClient};
use crate::services::{CatalogService, InventoryService, LedgerService, SessionManager};
use crate::util::retry::RetryPolicy;
use std::sync::Arc;

pub struct Repos {
    pub catalog: Arc<dyn CatalogRepo>,
    pub balance: Arc<dyn BalanceRepo>,
    pub inventory: Arc<dyn InventoryRepo>,
    pub chat: Arc<dyn ChatRepo>,
    pub totals: Arc<dyn TotalsRepo>,
}

impl Repos {
    pub fn postgres(db: Arc<Db>) -> Self {
        Self {
            catalog: Arc::new(CatalogRepository::new(db.clone())),
            balance: Arc::new(BalanceRepository::new(db.clone())),
            inventory: Arc::new(InventoryRepository::new(db.clone())),
            chat: Arc::new(ChatRepository::new(db.clone())),
            totals: Arc::new(TotalsRepository::new(db)),
        }
    }

    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// One object serving every repo trait
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: CatalogRepo + BalanceRepo + InventoryRepo + ChatRepo + TotalsRepo + 'static,
    {
        Self {
            catalog: store.clone(),
            balance: store.clone(),
            inventory: store.clone(),
            chat: store.clone(),
            totals: store,
        }
    }
}

pub struct Services {
    pub catalog: Arc<CatalogService>,
    pub ledger: Arc<LedgerService>,
    pub inventory: Arc<InventoryService>,
    pub sessions: Arc<SessionManager>,
}

pub struct Registry {
    pub config: Arc<Config>,
    /// Live game settings; starts out as `config.game`
    pub settings: SettingsHandle,
    pub repos: Arc<Repos>,
    pub services: Arc<Services>,
    /// Outbound messages, retried on transient failures
    pub client: Arc<dyn ChatClient>,
    pub retry: RetryPolicy,
}

impl Registry {
    pub fn new(config: Arc<Config>, repos: Repos, client: Arc<dyn ChatClient>) -> Self {
        Self::with_retry(config, repos, client, RetryPolicy::default())
    }

    pub fn with_retry(config: Arc<Config>, repos: Repos, client: Arc<dyn ChatClient>, retry: RetryPolicy) -> Self {
        let settings = SettingsHandle::new(config.game.clone());
        let repos = Arc::new(repos);

        let ledger = Arc::new(LedgerService::new(repos.balance.clone(), settings.clone(), retry));
        let inventory = Arc::new(InventoryService::new(
            repos.inventory.clone(),
            repos.catalog.clone(),
            repos.totals.clone(),
            retry,
        ));
        let catalog = Arc::new(CatalogService::new(repos.catalog.clone(), settings.clone(), retry));
        let sessions = Arc::new(SessionManager::new(inventory.clone(), ledger.clone(), settings.clone()));

        let services = Arc::new(Services {
            catalog,
            ledger,
            inventory,
            sessions,
        });

        Self {
            config,
            settings,
            repos,
            services,
            client: Arc::new(RetryingClient::new(client, retry)),
            retry,
        }
    }
}
