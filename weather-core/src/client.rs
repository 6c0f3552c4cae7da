use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt::Debug;

use crate::error::NetworkError;

pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_LANG: &str = "pt";
const UNITS: &str = "metric";

/// Anything that can hand back the raw current-weather payload for a city.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, city_name: &str) -> Result<String, NetworkError>;
}

/// HTTP client for the OpenWeatherMap current-weather endpoint.
///
/// Performs exactly one request per [`WeatherSource::fetch`] call, with the
/// transport's default timeouts.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    endpoint: String,
    lang: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            lang: DEFAULT_LANG.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Full request URL for `city_name`, query parameters form-encoded.
    pub fn request_url(&self, city_name: &str) -> Result<Url, NetworkError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", city_name),
                ("units", UNITS),
                ("appid", self.api_key.as_str()),
                ("lang", self.lang.as_str()),
            ],
        )
        .map_err(|err| NetworkError::Transport(format!("invalid endpoint {}: {err}", self.endpoint)))
    }
}

impl Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("endpoint", &self.endpoint)
            .field("lang", &self.lang)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[tracing::instrument(level = "debug", skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self, city_name: &str) -> Result<String, NetworkError> {
        let url = self.request_url(city_name)?;

        let res = self.http.get(url).send().await.map_err(|err| {
            let err = NetworkError::from(err);
            tracing::warn!(reason = %err.reason(), "request to weather provider failed");
            err
        })?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, "weather provider rejected request");
            return Err(NetworkError::HttpStatus(status.as_u16()));
        }

        let body = res
            .text()
            .await
            .map_err(|err| NetworkError::Transport(err.without_url().to_string()))?;

        tracing::debug!(bytes = body.len(), "received weather payload");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = r#"{"name":"Recife"}"#;

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::new("KEY".to_string())
            .with_endpoint(format!("{}/data/2.5/weather", server.uri()))
    }

    #[test]
    fn request_url_follows_provider_template() {
        let client = OpenWeatherClient::new("SECRET".to_string());
        let url = client.request_url("Sao Paulo").expect("valid url");

        assert_eq!(
            url.as_str(),
            "https://api.openweathermap.org/data/2.5/weather?q=Sao+Paulo&units=metric&appid=SECRET&lang=pt"
        );
    }

    #[test]
    fn request_url_escapes_city_name() {
        let client = OpenWeatherClient::new("K".to_string()).with_lang("en");
        let url = client.request_url("São Paulo&x=1").expect("valid url");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("q".to_string(), "São Paulo&x=1".to_string()));
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[3], ("lang".to_string(), "en".to_string()));
    }

    #[test]
    fn invalid_endpoint_is_transport_error() {
        let client = OpenWeatherClient::new("K".to_string()).with_endpoint("not a url");
        let err = client.request_url("Lima").unwrap_err();
        assert!(err.reason().starts_with("transport:"));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = OpenWeatherClient::new("TOPSECRET".to_string());
        assert!(!format!("{client:?}").contains("TOPSECRET"));
    }

    #[tokio::test]
    async fn fetch_returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Recife"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "KEY"))
            .and(query_param("lang", "pt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server).fetch("Recife").await.expect("fetch ok");
        assert_eq!(body, BODY);
    }

    #[tokio::test]
    async fn fetch_maps_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"cod":"404"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("Atlantis").await.unwrap_err();
        assert_eq!(err, NetworkError::HttpStatus(404));
        assert_eq!(err.reason(), "http-status:404");
    }

    /// Collects formatted log lines for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn dropped_connection_never_exposes_api_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // accept the request, then hang up without answering
            if let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let client = OpenWeatherClient::new("TOPSECRET".to_string())
            .with_endpoint(format!("http://{addr}/data/2.5/weather"));
        let err = client.fetch("Recife").await.unwrap_err();

        assert!(err.reason().starts_with("transport:"), "got {}", err.reason());
        assert!(!err.reason().contains("TOPSECRET"));
        assert!(!err.to_string().contains("TOPSECRET"));

        let logged = logs.contents();
        assert!(logged.contains("request to weather provider failed"));
        assert!(!logged.contains("TOPSECRET"), "log leaked key: {logged}");
    }

    #[tokio::test]
    async fn fetch_reports_unreachable_host() {
        // Nothing listens on port 1.
        let client = OpenWeatherClient::new("KEY".to_string())
            .with_endpoint("http://127.0.0.1:1/data/2.5/weather");

        let err = client.fetch("Recife").await.unwrap_err();
        assert_eq!(err, NetworkError::Unreachable);
    }
}
