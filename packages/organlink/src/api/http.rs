use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::config::ApiConfig;
use crate::error::{ApiError, Error};
use crate::log::API;
use reqwest::{Client, Url};
use tracing::debug;

///
/// `Transport` over HTTP, backed by a shared `reqwest::Client`
///
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<HttpTransport, Error> {
        let base_url = config.base_url()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("organlink/{}", crate::VERSION))
            .build()?;

        debug!(target: API, msg = "HTTP transport configured", base_url = %base_url, timeout = ?config.request_timeout());

        Ok(HttpTransport { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint paths are resolved below the base url, keeping any path prefix it has
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path.trim_start_matches('/')).map_err(|_| {
            ApiError::InvalidUrl {
                url: path.to_string(),
            }
            .into()
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let url = self.url(&request.path)?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
        };

        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
