use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::search::{
    backend_error, HealthResponse, QaRequest, SearchBackend, SearchIntent, SearchRequest,
    StatsResponse,
};
use crate::domain::DomainError;

/// Default request timeout for backend calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Search backend speaking JSON over HTTP via reqwest
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: reqwest::Client,
    base_url: Url,
    top_k: Option<u32>,
}

impl HttpSearchBackend {
    pub fn new(base_url: &str) -> Result<Self, DomainError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            DomainError::configuration(format!("Invalid backend URL '{}': {}", base_url, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(DomainError::configuration(format!(
                "Backend URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            top_k: None,
        })
    }

    /// Asks the server for a fixed number of results per model
    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DomainError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| DomainError::configuration("Backend URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, DomainError> {
        debug!("GET {}", url);
        let request = self.client.get(url);
        Self::send(request).await
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Value, DomainError> {
        debug!("POST {}", url);
        let request = self.client.post(url).json(body);
        Self::send(request).await
    }

    /// Sends a request and applies the backend's `{error}` convention
    ///
    /// The body is inspected whatever the status code: the server reports
    /// failures as `{error}` and may do so with a non-2xx status.
    async fn send(request: reqwest::RequestBuilder) -> Result<Value, DomainError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DomainError::network(format!("Request timed out: {}", e))
            } else {
                DomainError::network(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::network(format!("Failed to read response: {}", e)))?;

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            DomainError::network(format!("HTTP {}: unparsable response: {}", status, e))
        })?;

        if let Some(message) = backend_error(&payload) {
            return Err(DomainError::backend(message));
        }

        if !status.is_success() {
            return Err(DomainError::network(format!("HTTP {}: {}", status, body)));
        }

        Ok(payload)
    }

    fn decode<T: DeserializeOwned>(payload: Value, what: &str) -> Result<T, DomainError> {
        serde_json::from_value(payload)
            .map_err(|e| DomainError::network(format!("Failed to parse {} response: {}", what, e)))
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn stats(&self) -> Result<StatsResponse, DomainError> {
        let payload = self.get_json(self.endpoint(&["stats"])?).await?;
        Self::decode(payload, "stats")
    }

    async fn health(&self) -> Result<HealthResponse, DomainError> {
        let payload = self.get_json(self.endpoint(&["health"])?).await?;
        Self::decode(payload, "health")
    }

    async fn search(&self, intent: &SearchIntent) -> Result<Value, DomainError> {
        let body = SearchRequest::from_intent(intent, self.top_k);
        self.post_json(self.endpoint(&["search"])?, &body).await
    }

    async fn relationships(&self, word: &str) -> Result<Value, DomainError> {
        self.get_json(self.endpoint(&["relationships", word])?).await
    }

    async fn ask(&self, question: &str) -> Result<Value, DomainError> {
        let body = QaRequest {
            question: question.to_string(),
        };
        self.post_json(self.endpoint(&["qa"])?, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::SearchKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend_for(server: &MockServer) -> HttpSearchBackend {
        HttpSearchBackend::new(&server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_search_posts_exact_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({
                "query": "kitap",
                "type": "words",
                "models": ["dbmdz_bert"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "kitap",
                "type": "words",
                "models_used": ["dbmdz_bert"],
                "search_results": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let intent = SearchIntent::new("kitap", SearchKind::Words, ["dbmdz_bert"]);

        let payload = backend.fetch(&intent).await.unwrap();
        assert_eq!(payload["models_used"], json!(["dbmdz_bert"]));
    }

    #[tokio::test]
    async fn test_search_sends_top_k_when_configured() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({
                "query": "kitap",
                "type": "sentences",
                "models": ["a", "b"],
                "top_k": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"search_results": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await.with_top_k(Some(3));
        let intent = SearchIntent::new("kitap", SearchKind::Sentences, ["b", "a"]);

        backend.search(&intent).await.unwrap();
    }

    #[tokio::test]
    async fn test_relationships_escapes_word() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/relationships/%C3%A7i%C3%A7ek%20bah%C3%A7esi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "word": "çiçek bahçesi",
                "relationships": {"hiponim": ["gül"]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let payload = backend.relationships("çiçek bahçesi").await.unwrap();

        assert_eq!(payload["relationships"]["hiponim"], json!(["gül"]));
    }

    #[tokio::test]
    async fn test_qa_posts_question() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/qa"))
            .and(body_json(json!({"question": "Kitap nedir?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "question": "Kitap nedir?",
                "answer": "Basılı eser.",
                "confidence": 0.8
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let payload = backend.ask("Kitap nedir?").await.unwrap();

        assert_eq!(payload["answer"], json!("Basılı eser."));
    }

    #[tokio::test]
    async fn test_error_field_maps_to_backend_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "Search system is not ready"})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let intent = SearchIntent::new("kitap", SearchKind::Words, ["dbmdz_bert"]);

        let err = backend.search(&intent).await.unwrap_err();
        assert!(matches!(err, DomainError::Backend { .. }));
        assert_eq!(err.message(), "Search system is not ready");
    }

    #[tokio::test]
    async fn test_error_field_on_failure_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/relationships/x"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend.relationships("x").await.unwrap_err();

        assert!(matches!(err, DomainError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend.stats().await.unwrap_err();

        assert!(matches!(err, DomainError::Network { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "healthy"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let backend =
            HttpSearchBackend::with_timeout(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = backend.health().await.unwrap_err();

        assert!(matches!(err, DomainError::Network { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let backend = HttpSearchBackend::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        let err = backend.stats().await.unwrap_err();

        assert!(matches!(err, DomainError::Network { .. }));
    }

    #[tokio::test]
    async fn test_stats_decodes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sentences_count": 120,
                "words_count": 800,
                "relationships_count": 40,
                "models_loaded": 2,
                "available_models": ["dbmdz_bert", "turkcell_roberta"]
            })))
            .mount(&server)
            .await;

        let backend = HttpSearchBackend::new(&format!("{}/api/", server.uri())).unwrap();
        let stats = backend.stats().await.unwrap();

        assert_eq!(stats.models_loaded, 2);
        assert_eq!(stats.available_models[0], "dbmdz_bert");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpSearchBackend::new("not a url"),
            Err(DomainError::Configuration { .. })
        ));
    }
}
