use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use dashboard::cache::{CacheConfig, Namespace};
use dashboard::modal::ProductForm;
use dashboard::{ApiClient, CacheService, ClientError, DashboardController, KvStorage, LoadSource, MemoryStorage, ToastLevel, View};
use models::{Environment, Price, Service};
use serde_json::{json, Value};
use server::routes::build_router;
use server::ServerState;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Serve `router` on an ephemeral port and return its base url.
async fn serve(router: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok(format!("http://{}/", addr))
}

async fn start_api() -> anyhow::Result<String> {
    serve(build_router(ServerState::in_memory(), CorsLayer::very_permissive())).await
}

fn controller(base_url: &str) -> anyhow::Result<DashboardController> {
    let api = ApiClient::new(base_url)?;
    let cache = CacheService::new(Arc::new(MemoryStorage::new()), CacheConfig::default());
    Ok(DashboardController::new(api, cache, 15))
}

fn service(id: &str, categoria: &str) -> Service {
    Service {
        id: id.into(),
        tipo: "T".into(),
        servico: format!("Service {id}"),
        categoria: categoria.into(),
        segmento: "Agro".into(),
        ..Default::default()
    }
}

fn ids(items: &[Service]) -> Vec<&str> {
    items.iter().map(|s| s.id.as_str()).collect()
}

#[tokio::test]
async fn second_load_is_served_from_cache() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_service(&service("svc1", "A")).await?;

    assert_eq!(c.load_services(1, false).await?, LoadSource::Network);
    assert_eq!(c.load_services(1, false).await?, LoadSource::Cache);

    let toasts = c.take_toasts().await;
    assert!(toasts.iter().any(|t| t.level == ToastLevel::Info && t.message == "Loaded from cache"));
    let st = c.state().await;
    assert_eq!(ids(&st.services.items), vec!["svc1"]);
    assert_eq!(st.stats.services, 1);
    assert_eq!(c.cache().stats().services, 1);
    Ok(())
}

#[tokio::test]
async fn delete_invalidates_cache_and_reloads() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_service(&service("svc1", "A")).await?;
    c.api().create_service(&service("svc2", "A")).await?;
    c.load_services(1, false).await?;

    c.request_delete_service("svc1").await;
    assert!(c.state().await.confirm.is_open());
    assert!(c.confirm().await?);

    let st = c.state().await;
    assert!(!st.confirm.is_open());
    assert_eq!(ids(&st.services.items), vec!["svc2"]);
    let storage = c.cache().storage();
    for key in storage.keys() {
        let raw = storage.get_item(&key).unwrap_or_default();
        assert!(!raw.contains("\"svc1\""), "{key} still holds the deleted record");
    }
    let toasts = c.take_toasts().await;
    assert!(toasts.iter().any(|t| t.level == ToastLevel::Success && t.message == "Service deleted successfully"));
    Ok(())
}

#[tokio::test]
async fn cancelled_delete_keeps_the_record() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_service(&service("svc1", "A")).await?;

    c.request_delete_service("svc1").await;
    c.cancel_confirm().await;
    assert!(!c.confirm().await?);
    assert_eq!(c.api().get_service("svc1").await?.id, "svc1");
    Ok(())
}

// Deleting the only row of the last page reloads that same, now empty,
// page rather than stepping back to the previous one.
#[tokio::test]
async fn deleting_last_row_of_last_page_stays_on_that_page() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_service(&service("a", "A")).await?;
    c.api().create_service(&service("b", "A")).await?;
    c.change_services_limit(1).await?;
    c.load_services(2, false).await?;
    assert_eq!(ids(&c.state().await.services.items), vec!["b"]);

    c.request_delete_service("b").await;
    c.confirm().await?;

    let st = c.state().await;
    assert_eq!(st.services.pagination.page, 2);
    assert_eq!(st.services.pagination.total, 1);
    assert_eq!(st.services.pagination.total_pages, 1);
    assert!(st.services.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn changing_page_size_returns_to_first_page() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    for id in ["a", "b", "c"] {
        c.api().create_service(&service(id, "A")).await?;
        c.api().create_price(&Price { id: format!("p-{id}"), code: id.into(), ..Default::default() }).await?;
    }

    c.change_services_limit(1).await?;
    c.load_services(3, false).await?;
    assert_eq!(c.state().await.services.pagination.page, 3);
    c.change_services_limit(2).await?;
    let st = c.state().await;
    assert_eq!(st.services.pagination.page, 1);
    assert_eq!(st.services.pagination.limit, 2);
    assert_eq!(ids(&st.services.items), vec!["a", "b"]);

    c.change_prices_limit(1).await?;
    c.load_prices(2, false).await?;
    assert_eq!(c.state().await.prices.pagination.page, 2);
    c.change_prices_limit(2).await?;
    let st = c.state().await;
    assert_eq!(st.prices.pagination.page, 1);
    assert_eq!(st.prices.pagination.limit, 2);
    let price_ids: Vec<&str> = st.prices.items.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(price_ids, vec!["p-a", "p-b"]);
    Ok(())
}

#[tokio::test]
async fn service_editor_create_then_edit() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.show_view(View::Services).await?;

    c.open_service_create().await;
    c.update_service_form(|f| f.id = "svc9".into()).await;
    let err = c.submit_service().await.unwrap_err();
    assert!(matches!(err, ClientError::Form(_)));
    let st = c.state().await;
    assert!(st.service_modal.is_open());
    assert_eq!(st.service_modal.error(), Some("Missing required fields: tipo, servico, categoria, segmento"));

    c.update_service_form(|f| {
        f.tipo = "T".into();
        f.servico = "S".into();
        f.categoria = "A".into();
        f.segmento = "Agro".into();
        f.codigo = "12x".into();
        f.produtos.push(ProductForm { nome_produto: "Kit".into(), preco: "9.5".into(), ..Default::default() });
        f.produtos.push(ProductForm::default());
    })
    .await;
    let created = c.submit_service().await?;
    assert_eq!(created.codigo, 12);
    assert_eq!(created.produto.len(), 1);

    let st = c.state().await;
    assert!(!st.service_modal.is_open());
    assert_eq!(ids(&st.services.items), vec!["svc9"]);

    assert!(c.open_service_edit("svc9").await);
    assert!(c.state().await.service_modal.is_editing());
    c.update_service_form(|f| f.servico = "Renamed".into()).await;
    c.submit_service().await?;

    let stored = c.api().get_service("svc9").await?;
    assert_eq!(stored.servico, "Renamed");
    assert_eq!(stored.produto[0].nome_produto, "Kit");
    assert!(stored.created_at.is_some());
    assert!(!c.open_service_edit("missing").await);
    Ok(())
}

#[tokio::test]
async fn failed_submit_keeps_modal_open_with_server_message() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_price(&Price { id: "p1".into(), code: "C".into(), ..Default::default() }).await?;
    c.load_prices(1, false).await?;
    assert!(c.open_price_edit("p1").await);

    // a broken base url turns the submit into a network failure
    let broken = controller("http://127.0.0.1:9/")?;
    broken.open_price_create().await;
    broken
        .update_price_form(|f| {
            f.id = "p2".into();
            f.code = "C2".into();
        })
        .await;
    assert!(broken.submit_price().await.is_err());
    let st = broken.state().await;
    assert!(st.price_modal.is_open());
    assert!(st.price_modal.error().is_some());
    assert!(broken.take_toasts().await.iter().any(|t| t.level == ToastLevel::Error));
    Ok(())
}

#[tokio::test]
async fn price_editor_merges_and_env_filter_applies() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    let mut p1 = Price { id: "p1".into(), code: "C1".into(), um: "UN".into(), ..Default::default() };
    p1.prices.prd.insert("RJ".into(), "3.00".into());
    c.api().create_price(&p1).await?;
    c.load_prices(1, false).await?;

    assert!(c.open_price_edit("p1").await);
    c.update_price_form(|f| f.set_region(Environment::Homologation, "SP", " 10.00 ")).await;
    c.submit_price().await?;

    let stored = c.api().get_price("p1").await?;
    assert_eq!(stored.prices.get(Environment::Homologation, "SP"), Some("10.00"));
    assert_eq!(stored.prices.get(Environment::Production, "RJ"), Some("3.00"));
    assert_eq!(stored.um, "UN");

    // typed records always carry both tiers, so seed a PRD-only one raw
    reqwest::Client::new()
        .post(format!("{base}prices"))
        .json(&json!({"id": "p2", "code": "C2", "prices": {"PRD": {"MG": "1.00"}}}))
        .send()
        .await?
        .error_for_status()?;
    c.set_price_env("HML").await?;
    let st = c.state().await;
    assert_eq!(st.prices.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["p1"]);
    Ok(())
}

#[tokio::test]
async fn filter_options_come_from_all_services() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    for (id, cat) in [("s1", "Pulverizador"), ("s2", "Colheita"), ("s3", "Pulverizador")] {
        c.api().create_service(&service(id, cat)).await?;
    }
    c.change_services_limit(1).await?;

    let st = c.state().await;
    assert_eq!(st.filter_options.categorias, vec!["Colheita", "Pulverizador"]);
    assert_eq!(st.filter_options.segmentos, vec!["Agro"]);
    assert_eq!(st.services.items.len(), 1);
    assert!(c.cache().storage().keys().iter().any(|k| k.starts_with(Namespace::ServicesAll.prefix())));

    c.set_categoria("Colheita").await?;
    assert_eq!(ids(&c.state().await.services.items), vec!["s2"]);
    Ok(())
}

#[tokio::test]
async fn burst_of_search_input_reloads_once() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?.with_search_debounce(Duration::from_millis(80));
    c.api().create_service(&service("abc", "A")).await?;
    c.api().create_service(&service("xyz", "A")).await?;

    let pause = |ms| tokio::time::sleep(Duration::from_millis(ms));
    let (a, ab, abc) = tokio::join!(
        c.set_service_search("a"),
        async {
            pause(15).await;
            c.set_service_search("ab").await
        },
        async {
            pause(30).await;
            c.set_service_search("abc").await
        },
    );
    assert_eq!(a?, None);
    assert_eq!(ab?, None);
    assert_eq!(abc?, Some(LoadSource::Network));
    assert_eq!(ids(&c.state().await.services.items), vec!["abc"]);
    Ok(())
}

#[tokio::test]
async fn global_search_targets_current_view() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_price(&Price { id: "p-sp".into(), code: "ABC".into(), ..Default::default() }).await?;
    c.api().create_price(&Price { id: "p-rj".into(), code: "XYZ".into(), ..Default::default() }).await?;

    assert_eq!(c.global_search("abc").await?, None);
    c.show_view(View::Prices).await?;
    assert_eq!(c.global_search("ABC").await?, Some(LoadSource::Network));
    let st = c.state().await;
    assert_eq!(st.price_filters.search, "abc");
    assert_eq!(st.prices.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["p-sp"]);
    Ok(())
}

#[tokio::test]
async fn dashboard_stats_and_collection_browser() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_service(&service("svc1", "A")).await?;
    c.api().create_price(&Price { id: "p1".into(), code: "C".into(), ..Default::default() }).await?;

    assert!(c.api().health().await?);
    assert_eq!((c.api().count_services().await?, c.api().count_prices().await?), (1, 1));
    let stats = c.load_dashboard_stats().await;
    assert_eq!((stats.services, stats.prices, stats.collections), (1, 1, 2));

    c.show_view(View::Collections).await?;
    assert_eq!(c.state().await.collections.names, vec!["prices", "services"]);
    assert_eq!(c.view_collection("services").await?, 1);
    let toasts = c.take_toasts().await;
    assert!(toasts.iter().any(|t| t.message == "1 documents found in collection services"));
    let st = c.state().await;
    assert_eq!(st.collections.selected.as_deref(), Some("services"));
    assert_eq!(st.collections.documents[0].id, "svc1");
    assert!(!st.is_loading());
    Ok(())
}

#[tokio::test]
async fn unreachable_api_counts_as_zero() -> anyhow::Result<()> {
    let c = controller("http://127.0.0.1:9/")?;
    let stats = c.load_dashboard_stats().await;
    assert_eq!((stats.services, stats.prices, stats.collections), (0, 0, 0));
    Ok(())
}

#[tokio::test]
async fn quick_add_opens_a_blank_editor() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.quick_add_price().await?;
    let st = c.state().await;
    assert_eq!(st.view, View::Prices);
    assert!(st.price_modal.is_open() && !st.price_modal.is_editing());
    Ok(())
}

#[tokio::test]
async fn cache_actions() -> anyhow::Result<()> {
    let base = start_api().await?;
    let c = controller(&base)?;
    c.api().create_service(&service("svc1", "A")).await?;
    c.load_services(1, false).await?;
    assert_eq!(c.force_refresh_services().await?, LoadSource::Network);

    let stats = c.cache_stats().await;
    assert_eq!(stats.services, 1);
    c.clear_all_cache().await;
    assert!(c.cache().storage().is_empty());
    let toasts = c.take_toasts().await;
    assert!(toasts.iter().any(|t| t.message.starts_with("Cache: 1 services, 0 prices")));
    assert!(toasts.iter().any(|t| t.message == "Cache cleared"));
    Ok(())
}

// ===== Against scripted servers =====

fn page_body(id: &str, page: u32) -> Value {
    json!({
        "data": [{"id": id}],
        "pagination": {"page": page, "limit": 15, "total": 2, "totalPages": 2, "hasNext": page < 2, "hasPrev": page > 1}
    })
}

#[tokio::test]
async fn superseded_load_is_discarded() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/services",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            let page: u32 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
            let filter_fetch = q.get("limit").map(String::as_str) == Some("1000");
            if page == 1 && !filter_fetch {
                tokio::time::sleep(Duration::from_millis(300)).await;
                return Json(page_body("slow", 1));
            }
            Json(page_body("fast", page))
        }),
    );
    let base = serve(router).await?;
    let c = controller(&base)?;

    let (first, second) = tokio::join!(c.load_services(1, false), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        c.load_services(2, false).await
    });
    assert_eq!(first?, LoadSource::Stale);
    assert_eq!(second?, LoadSource::Network);

    let st = c.state().await;
    assert_eq!(ids(&st.services.items), vec!["fast"]);
    assert_eq!(st.services.pagination.page, 2);
    Ok(())
}

#[tokio::test]
async fn failed_load_clears_list_and_surfaces_server_message() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/prices",
        get(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Failed to get prices collection"})))
        }),
    );
    let base = serve(router).await?;
    let c = controller(&base)?;

    let err = c.load_prices(1, false).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "Failed to get prices collection");
    let st = c.state().await;
    assert!(st.prices.items.is_empty());
    assert_eq!(st.prices.pagination.total, 0);
    assert!(st.toasts.iter().any(|t| t.level == ToastLevel::Error && t.message == "Failed to load prices"));
    Ok(())
}

#[tokio::test]
async fn error_without_body_falls_back_to_generic_message() -> anyhow::Result<()> {
    let router = Router::new().route("/services/:id", get(|| async { StatusCode::BAD_GATEWAY }));
    let base = serve(router).await?;
    let c = controller(&base)?;
    let err = c.api().get_service("x").await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed");
    assert_eq!(err.status(), Some(502));
    Ok(())
}
