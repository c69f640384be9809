use crate::error::{ConfigError, Error};
use crate::log::DEVELOPMENT;
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{debug, info};

// See https://prometheus.io/docs/practices/naming/
pub const API_REQUESTS_TOTAL: &str = "organlink_api_requests_total";
pub const API_ERRORS_TOTAL: &str = "organlink_api_errors_total";
pub const API_REQUEST_DURATION_SECONDS: &str = "organlink_api_request_duration_seconds";

pub const NOTIFICATION_POLLS_TOTAL: &str = "organlink_notification_polls_total";
pub const NOTIFICATION_POLL_ERRORS_TOTAL: &str = "organlink_notification_poll_errors_total";
pub const NOTIFICATIONS_UNREAD: &str = "organlink_notifications_unread";

pub const MATCH_SEARCHES_TOTAL: &str = "organlink_match_searches_total";
pub const MATCH_REQUESTS_SENT_TOTAL: &str = "organlink_match_requests_sent_total";
pub const MATCH_RESPONSES_TOTAL: &str = "organlink_match_responses_total";

pub fn start(host: &str, port: u16) -> Result<(), Error> {
    let address = format!("{}:{}", host, port);
    let socket_address: SocketAddr =
        address
            .parse()
            .map_err(|_| ConfigError::InvalidParameter {
                name: "prometheus.port".to_string(),
                value: address.to_owned(),
            })?;

    debug!(target: DEVELOPMENT, msg = "Starting Prometheus exporter", port);

    PrometheusBuilder::new()
        .with_http_listener(socket_address)
        .install()?;

    describe_counter!(API_REQUESTS_TOTAL, "Number of OrganLink API requests");
    describe_counter!(
        API_ERRORS_TOTAL,
        "Number of OrganLink API requests that failed or returned a non-success status"
    );
    describe_histogram!(
        API_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of OrganLink API requests"
    );

    describe_counter!(NOTIFICATION_POLLS_TOTAL, "Number of notification polls");
    describe_counter!(
        NOTIFICATION_POLL_ERRORS_TOTAL,
        "Number of notification polls that failed"
    );
    describe_gauge!(
        NOTIFICATIONS_UNREAD,
        "Unread notifications in the latest poll, per portal"
    );

    describe_counter!(MATCH_SEARCHES_TOTAL, "Number of donor match searches");
    describe_counter!(MATCH_REQUESTS_SENT_TOTAL, "Number of match requests sent");
    describe_counter!(
        MATCH_RESPONSES_TOTAL,
        "Number of incoming match requests accepted or declined"
    );

    // Prometheus endpoint is empty on startup and looks like an error
    // Explicitly set unread to zero
    gauge!(NOTIFICATIONS_UNREAD).set(0);

    info!(msg = "Prometheus exporter started", port);
    Ok(())
}
