//! Everything the dashboard shows, in one container.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use models::{Document, PaginationMeta, Price, Service};
use serde::Serialize;

use crate::confirm::ConfirmPrompt;
use crate::modal::{EditorModal, PriceForm, ServiceForm};

/// Page size the dashboard starts with.
pub const DEFAULT_CLIENT_LIMIT: u32 = 15;
/// Page sizes offered by the limit selector.
pub const LIMIT_OPTIONS: [u32; 5] = [10, 15, 25, 50, 100];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum View {
    #[default]
    Dashboard,
    Services,
    Prices,
    Collections,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// One loaded page of a resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourcePage<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> ResourcePage<T> {
    pub fn empty(limit: u32) -> Self {
        Self { items: Vec::new(), pagination: PaginationMeta::compute(1, limit, 0) }
    }

    /// Drop the items and reset the metadata to an empty first page.
    pub fn clear(&mut self) {
        self.items.clear();
        self.pagination = PaginationMeta::compute(1, self.pagination.limit, 0);
    }
}

impl<T> Default for ResourcePage<T> {
    fn default() -> Self {
        Self::empty(DEFAULT_CLIENT_LIMIT)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceFilters {
    pub search: String,
    pub categoria: String,
    pub segmento: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceFilters {
    pub search: String,
    pub env: String,
}

/// Distinct values offered by the service filter dropdowns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categorias: Vec<String>,
    pub segmentos: Vec<String>,
}

impl FilterOptions {
    /// Sorted distinct non-empty `categoria` and `segmento` values.
    pub fn from_services(services: &[Service]) -> Self {
        let distinct = |f: fn(&Service) -> &str| -> Vec<String> {
            services
                .iter()
                .map(f)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        Self { categorias: distinct(|s| s.categoria.as_str()), segmentos: distinct(|s| s.segmento.as_str()) }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub services: u64,
    pub prices: u64,
    pub collections: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionView {
    pub names: Vec<String>,
    pub selected: Option<String>,
    pub documents: Vec<Document>,
}

/// What a confirmed prompt should do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    DeleteService(String),
    DeletePrice(String),
}

#[derive(Clone, Debug)]
pub struct DashboardState {
    pub view: View,
    pub services: ResourcePage<Service>,
    pub prices: ResourcePage<Price>,
    pub service_filters: ServiceFilters,
    pub price_filters: PriceFilters,
    pub filter_options: FilterOptions,
    pub stats: DashboardStats,
    pub collections: CollectionView,
    pub service_modal: EditorModal<ServiceForm>,
    pub price_modal: EditorModal<PriceForm>,
    pub confirm: ConfirmPrompt<PendingAction>,
    pub toasts: Vec<Toast>,
    /// Number of network operations in flight; the spinner shows while > 0.
    pub loading: u32,
}

impl DashboardState {
    pub fn new(limit: u32) -> Self {
        Self {
            view: View::Dashboard,
            services: ResourcePage::empty(limit),
            prices: ResourcePage::empty(limit),
            service_filters: ServiceFilters::default(),
            price_filters: PriceFilters::default(),
            filter_options: FilterOptions::default(),
            stats: DashboardStats::default(),
            collections: CollectionView::default(),
            service_modal: EditorModal::default(),
            price_modal: EditorModal::default(),
            confirm: ConfirmPrompt::default(),
            toasts: Vec::new(),
            loading: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading > 0
    }

    pub fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toasts.push(Toast::new(level, message));
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_LIMIT)
    }
}

/// Which list a load ticket belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadKind {
    Services,
    Prices,
    Collections,
}

/// Per-list monotonically increasing load tickets. A response is applied
/// only if its ticket is still the latest issued for that list.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    services: AtomicU64,
    prices: AtomicU64,
    collections: AtomicU64,
}

impl LoadSequencer {
    fn counter(&self, kind: LoadKind) -> &AtomicU64 {
        match kind {
            LoadKind::Services => &self.services,
            LoadKind::Prices => &self.prices,
            LoadKind::Collections => &self.collections,
        }
    }

    pub fn issue(&self, kind: LoadKind) -> u64 {
        self.counter(kind).fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, kind: LoadKind, ticket: u64) -> bool {
        self.counter(kind).load(Ordering::SeqCst) == ticket
    }
}
