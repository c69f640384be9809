use crate::api::{ApiClient, ApiRequest, ApiResponse, Transport};
use crate::error::Error;
use crate::session::{MemoryTokenStore, Portal, Session};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Duration;
/// This module contains test helpers
use tracing_subscriber::fmt::MakeWriter;

type Handler = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// In-memory `Transport` answering every request with `handler` and recording what was sent
pub(crate) struct FakeTransport {
    handler: Handler,
    delay: Option<Duration>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub(crate) fn new<F>(handler: F) -> Arc<FakeTransport>
    where
        F: Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    {
        Arc::new(FakeTransport {
            handler: Box::new(handler),
            delay: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Responses are held back for `delay`, use with a paused tokio clock
    pub(crate) fn delayed<F>(delay: Duration, handler: F) -> Arc<FakeTransport>
    where
        F: Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    {
        Arc::new(FakeTransport {
            handler: Box::new(handler),
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("lock shouldn't be poisoned").clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        self.requests
            .lock()
            .expect("lock shouldn't be poisoned")
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok((self.handler)(&request))
    }
}

/// Client signed in to `portal` with the token `test-token`
pub(crate) fn fake_client(transport: Arc<FakeTransport>, portal: Portal) -> ApiClient {
    let store = Arc::new(MemoryTokenStore::with_token(portal, "test-token"));
    let session = Session::new(portal, store).expect("memory store can't fail");
    ApiClient::new(transport, session)
}

/// Runs a function with all OL_ environment variables unset
pub(crate) fn with_no_ol_vars<F: FnOnce() -> R, R>(f: F) -> R {
    let ol_vars = std::env::vars()
        .map(|(k, _v)| k)
        .filter(|k| k.starts_with("OL_"))
        .collect::<Vec<_>>();

    temp_env::with_vars_unset(&ol_vars, f)
}

// Mock Writer for flexibly testing the logging behaviour, copy-pasted from
// tracing_subscriber's internal test code (with JSON functionality deleted).
// https://github.com/tokio-rs/tracing/blob/b02a700ba6850ad813f77e65144114f866074a8f/tracing-subscriber/src/fmt/mod.rs#L1247-L1314
pub(crate) struct MockWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MockWriter {
    pub(crate) fn new(buf: Arc<Mutex<Vec<u8>>>) -> Self {
        Self { buf }
    }

    pub(crate) fn map_error<Guard>(err: TryLockError<Guard>) -> io::Error {
        match err {
            TryLockError::WouldBlock => io::Error::from(io::ErrorKind::WouldBlock),
            TryLockError::Poisoned(_) => io::Error::from(io::ErrorKind::Other),
        }
    }

    pub(crate) fn buf(&self) -> io::Result<MutexGuard<'_, Vec<u8>>> {
        self.buf.try_lock().map_err(Self::map_error)
    }
}

impl io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buf()?.flush()
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockMakeWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MockMakeWriter {
    pub(crate) fn get_string(&self) -> String {
        let mut buf = self.buf.lock().expect("lock shouldn't be poisoned");
        let string = std::str::from_utf8(&buf[..])
            .expect("formatter should not have produced invalid utf-8")
            .to_owned();
        buf.clear();
        string
    }
}

impl<'a> MakeWriter<'a> for MockMakeWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MockWriter::new(self.buf.clone())
    }
}
