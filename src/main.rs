use std::{process::ExitCode, sync::Arc, time::Duration};

use rand::{rngs::StdRng, SeedableRng};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use valuegen::{
    config::Config,
    core::{
        app::{AppError, Application},
        broker::Broker,
        publisher::ValuePublisher,
        watchdog::ConnectionWatchdog,
    },
    logger::LoggerManager,
    print_error,
};
use valuegen_mqtt::{ClientBuilder, ConnectionKernel, MqttClient};

/// Console output is suppressed entirely when running under `NODE_ENV=test`,
/// including the messages printed before the logger exists.
fn quiet() -> bool {
    std::env::var("NODE_ENV").is_ok_and(|env| env == "test")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, initiating graceful shutdown...");
}

async fn run(cfg: Config, started: Instant) -> Result<(), AppError> {
    debug!("{:#?}", cfg);
    info!("Log level: {}", cfg.log_level);

    let broker_cfg = cfg.broker();
    info!("System connects to the MQTT broker @ {}.", cfg.broker_url);

    let (client, event_loop) = ClientBuilder::from_config(&broker_cfg)?.build();
    let client = MqttClient::new(client);

    let cancel = CancellationToken::new();
    let (kernel, events) =
        ConnectionKernel::new(event_loop, broker_cfg.reconnect_period(), cancel.clone());
    let watchdog = ConnectionWatchdog::new(started, kernel.subscribe_state());
    tokio::spawn(kernel.run());

    let publisher = ValuePublisher::new(
        Arc::new(client.clone()) as Arc<dyn Broker>,
        cfg.topic.clone(),
        cfg.value_range(),
        StdRng::from_entropy(),
    );
    let app = Application::new(publisher, cfg.broker_url.clone(), cfg.interval());

    info!(
        "Random value generator for topic {} started ({}, {}).",
        cfg.topic, cfg.name, cfg.environment
    );

    let result = app.run(events, watchdog, shutdown_signal()).await;

    if result.is_ok() {
        if let Err(e) = client.disconnect() {
            debug!("Clean disconnect failed: {}", e);
        }
        // Give the event loop a moment to flush the DISCONNECT.
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
        info!("Shutdown complete");
    }
    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let started = Instant::now();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            let err = AppError::from(e);
            if !quiet() {
                print_error!("{}", err);
            }
            return ExitCode::from(err.exit_code());
        }
    };

    if let Err(e) = LoggerManager::new(cfg.logger()).init() {
        let err = AppError::from(e);
        if !quiet() {
            print_error!("{}", err);
        }
        return ExitCode::from(err.exit_code());
    }
    info!("Starting valuegen version {}...", env!("CARGO_PKG_VERSION"));

    match run(cfg, started).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The watchdog already logged its own failure.
            if !matches!(e, AppError::ConnectionTimeout { .. }) {
                error!("{}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
