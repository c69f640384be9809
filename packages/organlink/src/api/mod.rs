mod client;
mod http;
mod response;
mod transport;

pub use client::ApiClient;
pub use http::HttpTransport;
pub use response::{decode, decode_ack, decode_list, Ack};
pub use transport::{ApiRequest, ApiResponse, Method, Transport};
