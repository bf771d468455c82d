//! HTTP client for the catalog admin REST API.

use std::time::Duration;

use models::{
    CountResponse, DeleteResponse, Document, ErrorBody, MutationResponse, Paginated, Price, Service,
};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{ClientError, GENERIC_REQUEST_FAILURE};

/// Query for `GET /services`. Empty strings are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceQuery {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub categoria: String,
    pub segmento: String,
}

/// Query for `GET /prices`. Empty strings are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceQuery {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub env: String,
}

fn query_pairs(page: u32, limit: u32, optional: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("page", page.max(1).to_string()), ("limit", limit.max(1).to_string())];
    pairs.extend(optional.iter().filter(|(_, v)| !v.is_empty()).map(|(k, v)| (*k, v.to_string())));
    pairs
}

impl ServiceQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        query_pairs(
            self.page,
            self.limit,
            &[("search", &self.search), ("categoria", &self.categoria), ("segmento", &self.segmento)],
        )
    }
}

impl PriceQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        query_pairs(self.page, self.limit, &[("search", &self.search), ("env", &self.env)])
    }
}

/// API client. Clone is cheap; `reqwest::Client` pools connections behind an Arc.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, None)
    }

    /// Build a client; `timeout` of `None` leaves requests unbounded.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::Url(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Url(format!("{base_url} cannot be a base url")));
        }
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self { client: builder.build()?, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base url, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        debug!(%method, %url, "api request");
        let mut req = self.client.request(method.clone(), url.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.error)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_REQUEST_FAILURE.to_string());
            warn!(%method, %url, status = status.as_u16(), %message, "api error");
            return Err(ClientError::Api { status: status.as_u16(), message });
        }
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
    ) -> Result<T, ClientError> {
        self.request::<(), T>(Method::GET, segments, query, None).await
    }

    pub async fn health(&self) -> Result<bool, ClientError> {
        let body: serde_json::Value = self.get(&["health"], &[]).await?;
        Ok(body.get("status").and_then(|s| s.as_str()) == Some("ok"))
    }

    // ===== Services =====

    pub async fn list_services(&self, q: &ServiceQuery) -> Result<Paginated<Service>, ClientError> {
        self.get(&["services"], &q.to_pairs()).await
    }

    pub async fn count_services(&self) -> Result<u64, ClientError> {
        let res: CountResponse = self.get(&["services", "count"], &[]).await?;
        Ok(res.count)
    }

    pub async fn get_service(&self, id: &str) -> Result<Service, ClientError> {
        self.get(&["services", id], &[]).await
    }

    pub async fn create_service(&self, service: &Service) -> Result<Service, ClientError> {
        let res: MutationResponse<Service> =
            self.request(Method::POST, &["services"], &[], Some(service)).await?;
        Ok(res.data)
    }

    pub async fn update_service(&self, id: &str, service: &Service) -> Result<Service, ClientError> {
        let res: MutationResponse<Service> =
            self.request(Method::PUT, &["services", id], &[], Some(service)).await?;
        Ok(res.data)
    }

    pub async fn delete_service(&self, id: &str) -> Result<String, ClientError> {
        let res: DeleteResponse = self.request::<(), _>(Method::DELETE, &["services", id], &[], None).await?;
        Ok(res.message)
    }

    // ===== Prices =====

    pub async fn list_prices(&self, q: &PriceQuery) -> Result<Paginated<Price>, ClientError> {
        self.get(&["prices"], &q.to_pairs()).await
    }

    pub async fn count_prices(&self) -> Result<u64, ClientError> {
        let res: CountResponse = self.get(&["prices", "count"], &[]).await?;
        Ok(res.count)
    }

    pub async fn get_price(&self, id: &str) -> Result<Price, ClientError> {
        self.get(&["prices", id], &[]).await
    }

    pub async fn create_price(&self, price: &Price) -> Result<Price, ClientError> {
        let res: MutationResponse<Price> = self.request(Method::POST, &["prices"], &[], Some(price)).await?;
        Ok(res.data)
    }

    pub async fn update_price(&self, id: &str, price: &Price) -> Result<Price, ClientError> {
        let res: MutationResponse<Price> =
            self.request(Method::PUT, &["prices", id], &[], Some(price)).await?;
        Ok(res.data)
    }

    pub async fn delete_price(&self, id: &str) -> Result<String, ClientError> {
        let res: DeleteResponse = self.request::<(), _>(Method::DELETE, &["prices", id], &[], None).await?;
        Ok(res.message)
    }

    // ===== Collections =====

    pub async fn list_collections(&self) -> Result<Vec<String>, ClientError> {
        self.get(&["collections"], &[]).await
    }

    pub async fn collection_documents(&self, name: &str) -> Result<Vec<Document>, ClientError> {
        self.get(&["collections", name], &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_are_not_sent() {
        let q = ServiceQuery { page: 2, limit: 15, search: "".into(), categoria: "A".into(), segmento: "".into() };
        assert_eq!(q.to_pairs(), vec![("page", "2".to_string()), ("limit", "15".to_string()), ("categoria", "A".to_string())]);
        let p = PriceQuery { page: 0, limit: 0, search: "x".into(), env: "".into() };
        assert_eq!(p.to_pairs(), vec![("page", "1".to_string()), ("limit", "1".to_string()), ("search", "x".to_string())]);
    }

    #[test]
    fn ids_are_percent_encoded_as_path_segments() {
        let api = ApiClient::new("http://localhost:3000/").unwrap();
        let url = api.url(&["services", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/services/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(ApiClient::new("mailto:x@y"), Err(ClientError::Url(_))));
        assert!(matches!(ApiClient::new("not a url"), Err(ClientError::Url(_))));
    }
}
