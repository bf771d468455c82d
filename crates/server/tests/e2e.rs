use std::net::SocketAddr;

use configs::{AppConfig, StoreBackend};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestApp {
    base_url: String,
    data_dir: std::path::PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Serve the full app over the file-backed store on an ephemeral port.
async fn start_server() -> anyhow::Result<TestApp> {
    let data_dir = std::env::temp_dir().join(format!("catalog_e2e_{}", Uuid::new_v4()));
    let static_dir = data_dir.join("public");
    tokio::fs::create_dir_all(&static_dir).await?;
    tokio::fs::write(static_dir.join("index.html"), "<html>dashboard</html>").await?;

    let mut cfg = AppConfig::default();
    cfg.store.backend = StoreBackend::File;
    cfg.store.data_dir = data_dir.join("store").to_string_lossy().into_owned();
    cfg.server.static_dir = static_dir.to_string_lossy().into_owned();

    let app = server::build_app(&cfg).await?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, data_dir })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().build().expect("reqwest client")
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_records_persist_to_collection_files() -> anyhow::Result<()> {
    let app = start_server().await?;
    let http = client();

    let res = http
        .post(format!("{}/services", app.base_url))
        .json(&json!({"id": "svc1", "tipo": "T", "servico": "S", "categoria": "A", "segmento": "B", "produto": []}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    let res = http
        .put(format!("{}/services/svc1", app.base_url))
        .json(&json!({"versao": "2"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["tipo"], "T");
    assert_eq!(body["data"]["versao"], "2");

    let on_disk = tokio::fs::read(app.data_dir.join("store").join("services.json")).await?;
    let stored: Value = serde_json::from_slice(&on_disk)?;
    assert_eq!(stored["svc1"]["versao"], "2");

    let names: Vec<String> = http.get(format!("{}/collections", app.base_url)).send().await?.json().await?;
    assert_eq!(names, vec!["services".to_string()]);
    Ok(())
}

#[tokio::test]
async fn e2e_static_dashboard_and_metrics() -> anyhow::Result<()> {
    let app = start_server().await?;
    let http = client();

    let res = http.get(format!("{}/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.text().await?.contains("dashboard"));

    http.get(format!("{}/services", app.base_url)).send().await?;
    let res = http.get(format!("{}/metrics", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.text().await?.contains("catalog_record_operations_total"));
    Ok(())
}
