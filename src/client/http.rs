//! HTTP implementation of the backend seam.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use super::{ClientError, FaturaBackend};
use crate::config::{Config, Endpoint};
use crate::model::{
    CheckoutSession, Fatura, FaturaId, FaturaInput, HealthResponse, ProcessEmailResponse,
};

/// `GET /faturas/` returns at most this many records per request
const PAGE_SIZE: usize = 100;

/// reqwest-backed client for the invoice backend
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

/// FastAPI error body: `{"detail": "..."}` or a list of validation errors
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpBackend {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client for the active environment
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            config.base_url(),
            Duration::from_secs(config.backend.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// URL addressing one record under an endpoint, e.g. `/faturas/7`
    fn item_url(&self, endpoint: Endpoint, id: FaturaId) -> String {
        format!("{}/{}", self.url(endpoint).trim_end_matches('/'), id)
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => match body.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            },
            Err(_) => text,
        };

        tracing::debug!(status = status.as_u16(), %detail, "backend returned error status");

        Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(ClientError::Malformed("empty response body".to_string()));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl FaturaBackend for HttpBackend {
    async fn list(&self) -> Result<Vec<Fatura>, ClientError> {
        let url = self.url(Endpoint::Faturas);
        let mut faturas = Vec::new();
        let mut seen = HashSet::new();
        let mut skip = 0;

        loop {
            tracing::debug!(%url, skip, "GET");
            let request = self
                .client
                .get(&url)
                .query(&[("skip", skip), ("limit", PAGE_SIZE)]);
            let page: Vec<Fatura> = Self::decode(self.send(request).await?).await?;

            let fetched = page.len();
            let before = faturas.len();
            faturas.extend(page.into_iter().filter(|f| seen.insert(f.id)));

            // A short page is the last one; a page with nothing new means
            // the backend ignored the paging parameters
            if fetched < PAGE_SIZE || faturas.len() == before {
                break;
            }
            skip += fetched;
        }

        Ok(faturas)
    }

    async fn get(&self, id: FaturaId) -> Result<Fatura, ClientError> {
        let url = self.item_url(Endpoint::Faturas, id);
        tracing::debug!(%url, "GET");
        let response = self.send(self.client.get(&url)).await?;
        Self::decode(response).await
    }

    async fn create(&self, input: &FaturaInput) -> Result<Fatura, ClientError> {
        let url = self.url(Endpoint::Faturas);
        tracing::debug!(%url, "POST");
        let response = self.send(self.client.post(&url).json(input)).await?;
        Self::decode(response).await
    }

    async fn update(&self, id: FaturaId, input: &FaturaInput) -> Result<Fatura, ClientError> {
        let url = self.item_url(Endpoint::Faturas, id);
        tracing::debug!(%url, "PUT");
        let response = self.send(self.client.put(&url).json(input)).await?;
        Self::decode(response).await
    }

    async fn delete(&self, id: FaturaId) -> Result<(), ClientError> {
        let url = self.item_url(Endpoint::Faturas, id);
        tracing::debug!(%url, "DELETE");
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn process_emails(&self) -> Result<ProcessEmailResponse, ClientError> {
        let url = self.url(Endpoint::ProcessEmail);
        tracing::debug!(%url, "POST");
        let response = self.send(self.client.post(&url)).await?;
        Self::decode(response).await
    }

    async fn checkout_session(&self, id: FaturaId) -> Result<CheckoutSession, ClientError> {
        let url = self.item_url(Endpoint::Checkout, id);
        tracing::debug!(%url, "POST");
        let response = self.send(self.client.post(&url)).await?;
        Self::decode(response).await
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.url(Endpoint::Health);
        tracing::debug!(%url, "GET");
        let response = self.send(self.client.get(&url)).await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{sample, sample_input};
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    type Db = Arc<Mutex<Vec<Fatura>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn list_faturas(State(db): State<Db>) -> Json<Vec<Fatura>> {
        Json(db.lock().unwrap().clone())
    }

    async fn create_fatura(State(db): State<Db>, Json(input): Json<FaturaInput>) -> Json<Fatura> {
        let mut db = db.lock().unwrap();
        let id = db.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        let fatura = Fatura {
            id,
            customer_name: input.customer_name,
            customer_document: input.customer_document,
            customer_email: input.customer_email,
            installation_number: input.installation_number,
            total_amount: input.total_amount,
            reference_month: input.reference_month,
            due_date: input.due_date,
            paid: false,
            pdf_url: input.pdf_url,
            created_at: None,
        };
        db.push(fatura.clone());
        Json(fatura)
    }

    async fn get_fatura(State(db): State<Db>, Path(id): Path<FaturaId>) -> impl IntoResponse {
        match db.lock().unwrap().iter().find(|f| f.id == id) {
            Some(f) => Json(f.clone()).into_response(),
            None => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"detail": "Fatura não encontrada"})),
            )
                .into_response(),
        }
    }

    async fn update_fatura(
        State(db): State<Db>,
        Path(id): Path<FaturaId>,
        Json(input): Json<FaturaInput>,
    ) -> impl IntoResponse {
        let mut db = db.lock().unwrap();
        match db.iter_mut().find(|f| f.id == id) {
            Some(f) => {
                f.customer_name = input.customer_name;
                f.total_amount = input.total_amount;
                Json(f.clone()).into_response()
            }
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn delete_fatura(State(db): State<Db>, Path(id): Path<FaturaId>) -> StatusCode {
        let mut db = db.lock().unwrap();
        let before = db.len();
        db.retain(|f| f.id != id);
        if db.len() < before {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    }

    async fn checkout(Path(id): Path<FaturaId>) -> Json<CheckoutSession> {
        Json(CheckoutSession {
            session_id: format!("cs_test_{}", id),
            checkout_url: format!("https://checkout.example/{}", id),
        })
    }

    async fn backend() -> (String, Db) {
        let db: Db = Arc::new(Mutex::new(vec![
            sample(1, "João Silva", "300123", 100.0, false),
            sample(2, "Maria Souza", "300456", 50.0, true),
        ]));

        let router = Router::new()
            .route("/faturas/", get(list_faturas).post(create_fatura))
            .route(
                "/faturas/:id",
                get(get_fatura).put(update_fatura).delete(delete_fatura),
            )
            .route("/create-checkout-session/:id", post(checkout))
            .route(
                "/processar_email/",
                post(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({"detail": "Banco de dados não disponível"})),
                    )
                }),
            )
            .route("/health", get(|| async { "ok" }))
            .with_state(db.clone());

        (serve(router).await, db)
    }

    fn client(base_url: &str) -> HttpBackend {
        HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[derive(Deserialize)]
    struct Paging {
        #[serde(default)]
        skip: usize,
        limit: Option<usize>,
    }

    /// Paged like the backend: `skip=0&limit=100` unless given
    async fn list_paged(State(db): State<Db>, Query(paging): Query<Paging>) -> Json<Vec<Fatura>> {
        let limit = paging.limit.unwrap_or(100);
        Json(
            db.lock()
                .unwrap()
                .iter()
                .skip(paging.skip)
                .take(limit)
                .cloned()
                .collect(),
        )
    }

    fn many(count: i64) -> Db {
        Arc::new(Mutex::new(
            (1..=count)
                .map(|id| sample(id, "Cliente", &format!("{}", 300000 + id), 10.0, false))
                .collect(),
        ))
    }

    #[tokio::test]
    async fn test_list_follows_pages() {
        let db = many(250);
        let router = Router::new()
            .route("/faturas/", get(list_paged))
            .with_state(db.clone());
        let url = serve(router).await;

        let listed = client(&url).list().await.unwrap();
        assert_eq!(listed.len(), 250);
        assert_eq!(listed[0].id, 1);
        assert_eq!(listed[249].id, 250);
    }

    #[tokio::test]
    async fn test_list_exact_page_multiple() {
        let router = Router::new()
            .route("/faturas/", get(list_paged))
            .with_state(many(200));
        let url = serve(router).await;

        assert_eq!(client(&url).list().await.unwrap().len(), 200);
    }

    #[tokio::test]
    async fn test_list_stops_when_paging_is_ignored() {
        let router = Router::new()
            .route("/faturas/", get(list_faturas))
            .with_state(many(150));
        let url = serve(router).await;

        assert_eq!(client(&url).list().await.unwrap().len(), 150);
    }

    #[test]
    fn test_item_urls() {
        let backend = client("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(
            backend.item_url(Endpoint::Faturas, 7),
            "http://localhost:8000/faturas/7"
        );
        assert_eq!(
            backend.item_url(Endpoint::Checkout, 7),
            "http://localhost:8000/create-checkout-session/7"
        );
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let (url, db) = backend().await;
        let backend = client(&url);

        let listed = backend.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].customer_name, "João Silva");

        let created = backend
            .create(&sample_input("Ana Lima", "300789", 75.5))
            .await
            .unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(db.lock().unwrap().len(), 3);

        let mut input = FaturaInput::from_fatura(&created);
        input.total_amount = 80.0;
        let updated = backend.update(3, &input).await.unwrap();
        assert_eq!(updated.total_amount, 80.0);

        assert_eq!(backend.get(3).await.unwrap().total_amount, 80.0);

        backend.delete(3).await.unwrap();
        assert_eq!(db.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_errors_carry_detail() {
        let (url, _db) = backend().await;
        let backend = client(&url);

        let err = backend.get(99).await.unwrap_err();
        match err {
            ClientError::Status { status, ref detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "Fatura não encontrada");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = backend.process_emails().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), "Backend database connection error");

        let err = backend.delete(99).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_checkout_session() {
        let (url, _db) = backend().await;
        let session = client(&url).checkout_session(1).await.unwrap();
        assert_eq!(session.checkout_url, "https://checkout.example/1");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (url, _db) = backend().await;
        let err = client(&url).health().await.unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr)).list().await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
