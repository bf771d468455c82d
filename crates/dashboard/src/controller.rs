//! Dashboard behavior: loads, filters, editors, deletes and notifications.
//!
//! All methods take `&self`; state lives behind a `tokio::sync::RwLock` that
//! is never held across a network call. Each list load takes a ticket from
//! the `LoadSequencer` and its response is dropped if a newer load for the
//! same list was issued in the meantime.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use models::{Paginated, Price, Service};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, PriceQuery, ServiceQuery};
use crate::cache::{params, CacheParams, CacheService, CacheStats, Namespace};
use crate::debounce::Debouncer;
use crate::errors::ClientError;
use crate::modal::{PriceForm, ServiceForm};
use crate::state::{
    DashboardState, DashboardStats, FilterOptions, LoadKind, LoadSequencer, PendingAction, Toast,
    ToastLevel, View, DEFAULT_CLIENT_LIMIT,
};
use crate::storage::KvStorage;
use crate::DashboardConfig;

/// Page size used to fetch every service when building filter options.
pub const ALL_RECORDS_LIMIT: u32 = 1000;

pub const LOADED_FROM_CACHE: &str = "Loaded from cache";

/// Where the data applied by a load came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Network,
    Cache,
    /// A newer load for the same list superseded this one; nothing applied.
    Stale,
}

pub struct DashboardController {
    api: ApiClient,
    cache: CacheService,
    state: RwLock<DashboardState>,
    seq: LoadSequencer,
    service_search: Debouncer,
    price_search: Debouncer,
}

impl DashboardController {
    pub fn new(api: ApiClient, cache: CacheService, default_limit: u32) -> Self {
        let limit = if default_limit == 0 { DEFAULT_CLIENT_LIMIT } else { default_limit };
        Self {
            api,
            cache,
            state: RwLock::new(DashboardState::new(limit)),
            seq: LoadSequencer::default(),
            service_search: Debouncer::default(),
            price_search: Debouncer::default(),
        }
    }

    pub fn from_config(cfg: &DashboardConfig, storage: Arc<dyn KvStorage>) -> Result<Self, ClientError> {
        let api = ApiClient::with_timeout(&cfg.base_url, cfg.request_timeout_ms.map(Duration::from_millis))?;
        let cache = CacheService::new(storage, cfg.cache.clone());
        Ok(Self::new(api, cache, cfg.default_limit))
    }

    /// Replace the search debounce window (both lists).
    pub fn with_search_debounce(mut self, wait: Duration) -> Self {
        self.service_search = Debouncer::new(wait);
        self.price_search = Debouncer::new(wait);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Drain pending notifications.
    pub async fn take_toasts(&self) -> Vec<Toast> {
        std::mem::take(&mut self.state.write().await.toasts)
    }

    async fn toast(&self, level: ToastLevel, message: impl Into<String>) {
        self.state.write().await.toast(level, message);
    }

    /// Run `fut` with the loading indicator raised.
    async fn tracked<T>(&self, fut: impl Future<Output = T>) -> T {
        self.state.write().await.loading += 1;
        let out = fut.await;
        let mut st = self.state.write().await;
        st.loading = st.loading.saturating_sub(1);
        out
    }

    // ===== Views =====

    /// Switch view and load what it shows.
    pub async fn show_view(&self, view: View) -> Result<(), ClientError> {
        self.state.write().await.view = view;
        match view {
            View::Dashboard => {
                self.load_dashboard_stats().await;
            }
            View::Services => {
                self.load_services(1, false).await?;
            }
            View::Prices => {
                self.load_prices(1, false).await?;
            }
            View::Collections => {
                self.load_collections().await?;
            }
        }
        Ok(())
    }

    pub async fn quick_add_service(&self) -> Result<(), ClientError> {
        self.show_view(View::Services).await?;
        self.open_service_create().await;
        Ok(())
    }

    pub async fn quick_add_price(&self) -> Result<(), ClientError> {
        self.show_view(View::Prices).await?;
        self.open_price_create().await;
        Ok(())
    }

    /// Route a header search box query to the current view's search filter.
    /// Returns `None` when the current view has no searchable list.
    pub async fn global_search(&self, query: &str) -> Result<Option<LoadSource>, ClientError> {
        let query = query.to_lowercase();
        let view = {
            let mut st = self.state.write().await;
            let view = st.view;
            match view {
                View::Services => st.service_filters.search = query,
                View::Prices => st.price_filters.search = query,
                _ => return Ok(None),
            }
            view
        };
        let source = match view {
            View::Services => self.load_services(1, false).await?,
            _ => self.load_prices(1, false).await?,
        };
        Ok(Some(source))
    }

    /// Totals for the dashboard cards. A failing call counts as zero.
    #[instrument(skip(self))]
    pub async fn load_dashboard_stats(&self) -> DashboardStats {
        let services_q = ServiceQuery { page: 1, limit: 1, ..Default::default() };
        let prices_q = PriceQuery { page: 1, limit: 1, ..Default::default() };
        let (services, prices, collections) = self
            .tracked(async {
                tokio::join!(
                    self.api.list_services(&services_q),
                    self.api.list_prices(&prices_q),
                    self.api.list_collections(),
                )
            })
            .await;
        let stats = DashboardStats {
            services: services.map(|p| p.pagination.total).unwrap_or_else(|e| {
                warn!(error = %e, "services total unavailable");
                0
            }),
            prices: prices.map(|p| p.pagination.total).unwrap_or_else(|e| {
                warn!(error = %e, "prices total unavailable");
                0
            }),
            collections: match collections {
                Ok(names) => {
                    let n = names.len() as u64;
                    self.state.write().await.collections.names = names;
                    n
                }
                Err(e) => {
                    warn!(error = %e, "collections unavailable");
                    0
                }
            },
        };
        self.state.write().await.stats = stats;
        stats
    }

    // ===== Services =====

    async fn service_request(&self, page: u32) -> (ServiceQuery, CacheParams) {
        let st = self.state.read().await;
        let f = &st.service_filters;
        let query = ServiceQuery {
            page: page.max(1),
            limit: st.services.pagination.limit,
            search: f.search.clone(),
            categoria: f.categoria.clone(),
            segmento: f.segmento.clone(),
        };
        let key = params([
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("search", query.search.clone()),
            ("categoria", query.categoria.clone()),
            ("segmento", query.segmento.clone()),
        ]);
        (query, key)
    }

    /// Load a page of services with the current filters. Unless `force`, a
    /// fresh cache entry is used instead of the network.
    #[instrument(skip(self))]
    pub async fn load_services(&self, page: u32, force: bool) -> Result<LoadSource, ClientError> {
        let (query, key) = self.service_request(page).await;
        let ticket = self.seq.issue(LoadKind::Services);

        if !force {
            if let Some(cached) = self.cache.get_typed::<Paginated<Service>>(Namespace::Services, &key) {
                self.apply_services(cached).await;
                self.toast(ToastLevel::Info, LOADED_FROM_CACHE).await;
                self.refresh_filter_options().await;
                return Ok(LoadSource::Cache);
            }
        }

        let result = self.tracked(self.api.list_services(&query)).await;
        if !self.seq.is_current(LoadKind::Services, ticket) {
            debug!(ticket, "discarding superseded services response");
            return Ok(LoadSource::Stale);
        }
        match result {
            Ok(page) => {
                self.cache.set_typed(Namespace::Services, &page, &key);
                self.apply_services(page).await;
            }
            Err(e) => {
                let mut st = self.state.write().await;
                st.services.clear();
                st.toast(ToastLevel::Error, "Failed to load services");
                return Err(e);
            }
        }
        self.refresh_filter_options().await;
        Ok(LoadSource::Network)
    }

    async fn apply_services(&self, page: Paginated<Service>) {
        let mut st = self.state.write().await;
        st.stats.services = page.pagination.total;
        st.services.items = page.data;
        st.services.pagination = page.pagination;
    }

    /// Rebuild the categoria/segmento options from every service, using the
    /// "all records" cache when fresh.
    pub async fn refresh_filter_options(&self) -> FilterOptions {
        let key = params([("limit", ALL_RECORDS_LIMIT)]);
        let all = match self.cache.get_typed::<Paginated<Service>>(Namespace::ServicesAll, &key) {
            Some(all) => all,
            None => {
                let query = ServiceQuery { page: 1, limit: ALL_RECORDS_LIMIT, ..Default::default() };
                match self.api.list_services(&query).await {
                    Ok(all) => {
                        self.cache.set_typed(Namespace::ServicesAll, &all, &key);
                        all
                    }
                    Err(e) => {
                        warn!(error = %e, "filter options not refreshed");
                        return self.state.read().await.filter_options.clone();
                    }
                }
            }
        };
        let options = FilterOptions::from_services(&all.data);
        self.state.write().await.filter_options = options.clone();
        options
    }

    /// Update the search text and reload page 1 once typing pauses. Returns
    /// `None` when a later keystroke took over the reload.
    pub async fn set_service_search(&self, text: &str) -> Result<Option<LoadSource>, ClientError> {
        self.state.write().await.service_filters.search = text.to_string();
        if !self.service_search.settle().await {
            return Ok(None);
        }
        self.load_services(1, false).await.map(Some)
    }

    pub async fn set_categoria(&self, categoria: &str) -> Result<LoadSource, ClientError> {
        self.state.write().await.service_filters.categoria = categoria.to_string();
        self.load_services(1, false).await
    }

    pub async fn set_segmento(&self, segmento: &str) -> Result<LoadSource, ClientError> {
        self.state.write().await.service_filters.segmento = segmento.to_string();
        self.load_services(1, false).await
    }

    pub async fn change_services_limit(&self, limit: u32) -> Result<LoadSource, ClientError> {
        self.state.write().await.services.pagination.limit = limit.max(1);
        self.load_services(1, false).await
    }

    pub async fn force_refresh_services(&self) -> Result<LoadSource, ClientError> {
        self.cache.invalidate("services");
        self.load_services(1, true).await
    }

    pub async fn open_service_create(&self) {
        self.state.write().await.service_modal.open_create(ServiceForm::default());
    }

    /// Open the editor on a service of the loaded page. `false` if the id is
    /// not on the page.
    pub async fn open_service_edit(&self, id: &str) -> bool {
        let mut st = self.state.write().await;
        let Some(form) = st.services.items.iter().find(|s| s.id == id).map(ServiceForm::from_service) else {
            return false;
        };
        st.service_modal.open_edit(id, form);
        true
    }

    /// Apply `edit` to the open service form. `false` if no editor is open.
    pub async fn update_service_form(&self, edit: impl FnOnce(&mut ServiceForm)) -> bool {
        match self.state.write().await.service_modal.form_mut() {
            Some(form) => {
                edit(form);
                true
            }
            None => false,
        }
    }

    pub async fn close_service_modal(&self) {
        self.state.write().await.service_modal.close();
    }

    /// Persist the open service form. On success the modal closes and the
    /// current page reloads past the cache; on failure the modal stays open
    /// with the error.
    #[instrument(skip(self))]
    pub async fn submit_service(&self) -> Result<Service, ClientError> {
        let (form, backing_id, page) = {
            let st = self.state.read().await;
            let Some(form) = st.service_modal.form() else {
                return Err(ClientError::Form("No service editor open".into()));
            };
            (form.clone(), st.service_modal.backing_id().map(str::to_string), st.services.pagination.page)
        };
        let result = match form.to_service() {
            Ok(service) => {
                self.tracked(async {
                    match &backing_id {
                        Some(id) => self.api.update_service(id, &service).await,
                        None => self.api.create_service(&service).await,
                    }
                })
                .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(saved) => {
                self.cache.invalidate("services");
                {
                    let mut st = self.state.write().await;
                    st.service_modal.close();
                    let msg = if backing_id.is_some() { "Service updated successfully" } else { "Service created successfully" };
                    st.toast(ToastLevel::Success, msg);
                }
                info!(id = %saved.id, "service saved");
                self.reload_services(page).await;
                Ok(saved)
            }
            Err(e) => {
                let mut st = self.state.write().await;
                st.service_modal.set_error(e.to_string());
                st.toast(ToastLevel::Error, e.to_string());
                Err(e)
            }
        }
    }

    async fn reload_services(&self, page: u32) {
        if let Err(e) = self.load_services(page, true).await {
            warn!(error = %e, page, "services reload failed");
        }
    }

    pub async fn request_delete_service(&self, id: &str) {
        self.state
            .write()
            .await
            .confirm
            .ask(format!("Delete service {id}?"), PendingAction::DeleteService(id.to_string()));
    }

    // ===== Prices =====

    async fn price_request(&self, page: u32) -> (PriceQuery, CacheParams) {
        let st = self.state.read().await;
        let f = &st.price_filters;
        let query = PriceQuery {
            page: page.max(1),
            limit: st.prices.pagination.limit,
            search: f.search.clone(),
            env: f.env.clone(),
        };
        let key = params([
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("search", query.search.clone()),
            ("env", query.env.clone()),
        ]);
        (query, key)
    }

    #[instrument(skip(self))]
    pub async fn load_prices(&self, page: u32, force: bool) -> Result<LoadSource, ClientError> {
        let (query, key) = self.price_request(page).await;
        let ticket = self.seq.issue(LoadKind::Prices);

        if !force {
            if let Some(cached) = self.cache.get_typed::<Paginated<Price>>(Namespace::Prices, &key) {
                self.apply_prices(cached).await;
                self.toast(ToastLevel::Info, LOADED_FROM_CACHE).await;
                return Ok(LoadSource::Cache);
            }
        }

        let result = self.tracked(self.api.list_prices(&query)).await;
        if !self.seq.is_current(LoadKind::Prices, ticket) {
            debug!(ticket, "discarding superseded prices response");
            return Ok(LoadSource::Stale);
        }
        match result {
            Ok(page) => {
                self.cache.set_typed(Namespace::Prices, &page, &key);
                self.apply_prices(page).await;
                Ok(LoadSource::Network)
            }
            Err(e) => {
                let mut st = self.state.write().await;
                st.prices.clear();
                st.toast(ToastLevel::Error, "Failed to load prices");
                Err(e)
            }
        }
    }

    async fn apply_prices(&self, page: Paginated<Price>) {
        let mut st = self.state.write().await;
        st.stats.prices = page.pagination.total;
        st.prices.items = page.data;
        st.prices.pagination = page.pagination;
    }

    pub async fn set_price_search(&self, text: &str) -> Result<Option<LoadSource>, ClientError> {
        self.state.write().await.price_filters.search = text.to_string();
        if !self.price_search.settle().await {
            return Ok(None);
        }
        self.load_prices(1, false).await.map(Some)
    }

    /// Filter by environment (`HML`, `PRD`, or empty for all).
    pub async fn set_price_env(&self, env: &str) -> Result<LoadSource, ClientError> {
        self.state.write().await.price_filters.env = env.to_string();
        self.load_prices(1, false).await
    }

    pub async fn change_prices_limit(&self, limit: u32) -> Result<LoadSource, ClientError> {
        self.state.write().await.prices.pagination.limit = limit.max(1);
        self.load_prices(1, false).await
    }

    pub async fn force_refresh_prices(&self) -> Result<LoadSource, ClientError> {
        self.cache.invalidate("prices");
        self.load_prices(1, true).await
    }

    pub async fn open_price_create(&self) {
        self.state.write().await.price_modal.open_create(PriceForm::default());
    }

    pub async fn open_price_edit(&self, id: &str) -> bool {
        let mut st = self.state.write().await;
        let Some(form) = st.prices.items.iter().find(|p| p.id == id).map(PriceForm::from_price) else {
            return false;
        };
        st.price_modal.open_edit(id, form);
        true
    }

    pub async fn update_price_form(&self, edit: impl FnOnce(&mut PriceForm)) -> bool {
        match self.state.write().await.price_modal.form_mut() {
            Some(form) => {
                edit(form);
                true
            }
            None => false,
        }
    }

    pub async fn close_price_modal(&self) {
        self.state.write().await.price_modal.close();
    }

    #[instrument(skip(self))]
    pub async fn submit_price(&self) -> Result<Price, ClientError> {
        let (form, backing_id, page) = {
            let st = self.state.read().await;
            let Some(form) = st.price_modal.form() else {
                return Err(ClientError::Form("No price editor open".into()));
            };
            (form.clone(), st.price_modal.backing_id().map(str::to_string), st.prices.pagination.page)
        };
        let result = match form.to_price() {
            Ok(price) => {
                self.tracked(async {
                    match &backing_id {
                        Some(id) => self.api.update_price(id, &price).await,
                        None => self.api.create_price(&price).await,
                    }
                })
                .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(saved) => {
                self.cache.invalidate("prices");
                {
                    let mut st = self.state.write().await;
                    st.price_modal.close();
                    let msg = if backing_id.is_some() { "Price updated successfully" } else { "Price created successfully" };
                    st.toast(ToastLevel::Success, msg);
                }
                info!(id = %saved.id, "price saved");
                self.reload_prices(page).await;
                Ok(saved)
            }
            Err(e) => {
                let mut st = self.state.write().await;
                st.price_modal.set_error(e.to_string());
                st.toast(ToastLevel::Error, e.to_string());
                Err(e)
            }
        }
    }

    async fn reload_prices(&self, page: u32) {
        if let Err(e) = self.load_prices(page, true).await {
            warn!(error = %e, page, "prices reload failed");
        }
    }

    pub async fn request_delete_price(&self, id: &str) {
        self.state
            .write()
            .await
            .confirm
            .ask(format!("Delete price {id}?"), PendingAction::DeletePrice(id.to_string()));
    }

    // ===== Confirmation =====

    /// Run the pending confirmed action. `Ok(false)` if nothing was pending.
    ///
    /// After a delete the current page is reloaded as-is, even when it is now
    /// past the last page.
    pub async fn confirm(&self) -> Result<bool, ClientError> {
        let action = self.state.write().await.confirm.confirm();
        let Some(action) = action else {
            return Ok(false);
        };
        let (resource, result) = match &action {
            PendingAction::DeleteService(id) => ("services", self.tracked(self.api.delete_service(id)).await),
            PendingAction::DeletePrice(id) => ("prices", self.tracked(self.api.delete_price(id)).await),
        };
        match result {
            Ok(message) => {
                self.cache.invalidate(resource);
                self.toast(ToastLevel::Success, message).await;
                let (services_page, prices_page) = {
                    let st = self.state.read().await;
                    (st.services.pagination.page, st.prices.pagination.page)
                };
                match action {
                    PendingAction::DeleteService(_) => self.reload_services(services_page).await,
                    PendingAction::DeletePrice(_) => self.reload_prices(prices_page).await,
                }
                Ok(true)
            }
            Err(e) => {
                self.toast(ToastLevel::Error, e.to_string()).await;
                Err(e)
            }
        }
    }

    pub async fn cancel_confirm(&self) {
        self.state.write().await.confirm.cancel();
    }

    // ===== Collections =====

    #[instrument(skip(self))]
    pub async fn load_collections(&self) -> Result<Vec<String>, ClientError> {
        let ticket = self.seq.issue(LoadKind::Collections);
        let result = self.tracked(self.api.list_collections()).await;
        if !self.seq.is_current(LoadKind::Collections, ticket) {
            debug!(ticket, "discarding superseded collections response");
            return result;
        }
        let mut st = self.state.write().await;
        match &result {
            Ok(names) => {
                st.collections.names = names.clone();
                st.stats.collections = names.len() as u64;
            }
            Err(_) => {
                st.collections.names.clear();
                st.toast(ToastLevel::Error, "Failed to load collections");
            }
        }
        result
    }

    /// Fetch every document of a collection into the browser pane.
    #[instrument(skip(self))]
    pub async fn view_collection(&self, name: &str) -> Result<usize, ClientError> {
        match self.tracked(self.api.collection_documents(name)).await {
            Ok(docs) => {
                let n = docs.len();
                let mut st = self.state.write().await;
                st.collections.selected = Some(name.to_string());
                st.collections.documents = docs;
                st.toast(ToastLevel::Info, format!("{n} documents found in collection {name}"));
                Ok(n)
            }
            Err(e) => {
                self.toast(ToastLevel::Error, "Failed to load documents").await;
                Err(e)
            }
        }
    }

    // ===== Cache =====

    pub async fn clear_all_cache(&self) {
        self.cache.clear_all();
        self.toast(ToastLevel::Success, "Cache cleared").await;
    }

    /// Cache usage, also announced as a toast.
    pub async fn cache_stats(&self) -> CacheStats {
        let stats = self.cache.stats();
        self.toast(
            ToastLevel::Info,
            format!("Cache: {} services, {} prices ({}KB)", stats.services, stats.prices, stats.total_size_kb),
        )
        .await;
        stats
    }
}
