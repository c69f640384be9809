use super::response::{decode, decode_ack, decode_list};
use super::{Ack, ApiRequest, ApiResponse, HttpTransport, Transport};
use crate::config::ApiConfig;
use crate::error::Error;
use crate::log::API;
use crate::prometheus::{API_ERRORS_TOTAL, API_REQUESTS_TOTAL, API_REQUEST_DURATION_SECONDS};
use crate::session::{Portal, Session};
use metrics::{counter, histogram};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

///
/// Authenticated client for one portal of the OrganLink API.
///
/// Every request carries the portal's bearer token, looked up when the request is sent.
/// Requests race the client's cancellation token and resolve to `Error::Cancelled` once it fires.
///
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Session,
    cancel: CancellationToken,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> ApiClient {
        ApiClient {
            transport,
            session,
            cancel: CancellationToken::new(),
        }
    }

    pub fn connect(config: &ApiConfig, session: Session) -> Result<ApiClient, Error> {
        let transport = HttpTransport::new(config)?;
        Ok(ApiClient::new(Arc::new(transport), session))
    }

    ///
    /// A client sharing this transport and session whose requests are cancelled by `cancel`
    ///
    pub fn with_cancellation(&self, cancel: CancellationToken) -> ApiClient {
        ApiClient {
            transport: self.transport.clone(),
            session: self.session.clone(),
            cancel,
        }
    }

    pub fn portal(&self) -> Portal {
        self.session.portal()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self.send(ApiRequest::get(path)).await?;
        decode(&response)
    }

    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let response = self.send(ApiRequest::get(path)).await?;
        decode_list(&response)
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, Error> {
        let response = self.send(ApiRequest::post(path, body)).await?;
        decode(&response)
    }

    pub async fn post_ack(&self, path: &str, body: Value) -> Result<Ack, Error> {
        let response = self.send(ApiRequest::post(path, body)).await?;
        decode_ack(&response)
    }

    pub async fn patch_ack(&self, path: &str) -> Result<Ack, Error> {
        let response = self.send(ApiRequest::patch(path)).await?;
        decode_ack(&response)
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let token = self.session.token()?;

        let method = request.method;
        let path = request.path.clone();
        let request = request.with_token(token);

        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = self.transport.send(request) => result,
        };

        let duration = start.elapsed();

        counter!(API_REQUESTS_TOTAL).increment(1);
        histogram!(API_REQUEST_DURATION_SECONDS).record(duration);

        match &result {
            Ok(response) => {
                debug!(target: API, msg = "Response", %method, path = %path, status = response.status, ?duration);
                if !response.is_success() {
                    counter!(API_ERRORS_TOTAL).increment(1);
                }
            }
            Err(Error::Cancelled) => {
                debug!(target: API, msg = "Request cancelled", %method, path = %path);
            }
            Err(err) => {
                counter!(API_ERRORS_TOTAL).increment(1);
                warn!(target: API, msg = "Request failed", %method, path = %path, error = err.to_string());
            }
        }

        result
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("session", &self.session)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
