use clap::Parser;
use organlink::cli::{self, Args};
use organlink::config::OrganLinkConfig;
use organlink::log;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match OrganLinkConfig::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration Error: {}", err);
            std::process::exit(exitcode::CONFIG);
        }
    };

    log::init(config.log.clone());

    info!(
        msg = "OrganLink",
        version = organlink::VERSION,
        base_url = %config.api.base_url,
        portal = %config.session.portal
    );

    let code = match cli::run(args, config).await {
        Ok(code) => code,
        Err(err) => {
            error!(msg = "Command failed", error = err.to_string());
            eprintln!("{}", err.user_message());
            cli::exit_code(&err)
        }
    };

    std::process::exit(code);
}
