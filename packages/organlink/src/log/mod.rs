pub mod subscriber;
mod targets;

pub use targets::{API, CONFIG, DEVELOPMENT, MATCHING, NOTIFY, SESSION};

use crate::config::{LogConfig, LogFormat};
use std::sync::Once;
use tracing_subscriber::{
    fmt::{
        format::{DefaultFields, Format},
        writer::BoxMakeWriter,
        SubscriberBuilder,
    },
    EnvFilter,
};

static INIT: Once = Once::new();

type Subscriber = Box<dyn tracing::Subscriber + Send + Sync>;

pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let subscriber = subscriber::builder(&config);
        let subscriber = set_format(&config, subscriber);

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Could not set the tracing subscriber: {err}");
        }
    });
}

pub fn set_format(
    config: &LogConfig,
    builder: SubscriberBuilder<DefaultFields, Format, EnvFilter, BoxMakeWriter>,
) -> Subscriber {
    match &config.format {
        LogFormat::Pretty => Box::new(builder.pretty().finish()),
        LogFormat::Structured => Box::new(builder.json().finish()),
        LogFormat::Text => Box::new(builder.finish()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::test_helpers::MockMakeWriter;
    use tracing::dispatcher::set_default;
    use tracing::{debug, error, info, trace, warn};

    #[test]
    fn test_simple_log() {
        let make_writer = MockMakeWriter::default();

        let config = LogConfig::default();

        let subscriber =
            subscriber::builder(&config).with_writer(BoxMakeWriter::new(make_writer.clone()));

        let subscriber = set_format(&config, subscriber);

        let _default = set_default(&subscriber.into());

        error!("error message");

        let log_contents = make_writer.get_string();
        assert!(log_contents.contains("error message"));
    }

    #[test]
    fn test_log_levels() {
        let make_writer = MockMakeWriter::default();

        let config = LogConfig::with_level(LogLevel::Warn);

        let subscriber =
            subscriber::builder(&config).with_writer(BoxMakeWriter::new(make_writer.clone()));

        let subscriber = set_format(&config, subscriber);

        let _default = set_default(&subscriber.into());

        trace!("trace message");
        debug!("debug message");
        info!("info message");
        warn!("warn message");
        error!("error message");

        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("trace message"));
        assert!(!log_contents.contains("debug message"));
        assert!(!log_contents.contains("info message"));
        assert!(log_contents.contains("warn message"));
        assert!(log_contents.contains("error message"));
    }

    #[test]
    fn test_log_levels_with_targets() {
        let make_writer = MockMakeWriter::default();

        let config = LogConfig {
            format: LogFormat::Text,
            output: LogConfig::default_log_output(),
            ansi_enabled: false,
            level: LogLevel::Info,
            development_level: LogLevel::Info,
            api_level: LogLevel::Debug,
            config_level: LogLevel::Info,
            matching_level: LogLevel::Error,
            notify_level: LogLevel::Trace,
            session_level: LogLevel::Info,
        };

        let subscriber =
            subscriber::builder(&config).with_writer(BoxMakeWriter::new(make_writer.clone()));

        let subscriber = set_format(&config, subscriber);

        let _default = set_default(&subscriber.into());

        // with api level 'debug', debug should be logged but not trace
        trace!(target: API, "trace/api");
        debug!(target: API, "debug/api");
        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("trace/api"));
        assert!(log_contents.contains("debug/api"));

        // with matching level 'error', error should be logged but not warn
        warn!(target: MATCHING, "warn/matching");
        error!(target: MATCHING, "error/matching");
        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("warn/matching"));
        assert!(log_contents.contains("error/matching"));

        // with notify level 'trace', trace should be logged
        trace!(target: NOTIFY, "trace/notify");
        let log_contents = make_writer.get_string();
        assert!(log_contents.contains("trace/notify"));

        // with session level 'info', info should be logged but not debug
        debug!(target: SESSION, "debug/session");
        info!(target: SESSION, "info/session");
        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("debug/session"));
        assert!(log_contents.contains("info/session"));
    }

    #[test]
    fn test_log_format_structured() {
        let make_writer = MockMakeWriter::default();

        let mut config = LogConfig::with_level(LogLevel::Info);
        config.format = LogFormat::Structured;

        let subscriber =
            subscriber::builder(&config).with_writer(BoxMakeWriter::new(make_writer.clone()));

        let subscriber = set_format(&config, subscriber);

        let _default = set_default(&subscriber.into());

        info!(msg = "message", value = 42);

        let log_contents = make_writer.get_string();

        assert!(log_contents.contains(r#"fields":{"msg":"message","value":42}"#));
    }
}
