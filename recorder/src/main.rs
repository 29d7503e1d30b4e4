mod aggregate;
mod channel;
mod errors;
mod frame;
mod metrics;
mod model;
mod recorder;
mod rest;
mod store;

use axum::{routing::get, Router};
use channel::{SensorConfig, SerialChannel};
use recorder::{Controller, RecorderSettings};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let serial_port = env::var("SERIAL_PORT").unwrap_or_else(|_| "/dev/ttyACM0".to_string());
    let baud_rate: u32 = env::var("BAUD_RATE")
        .unwrap_or_else(|_| "9600".to_string())
        .parse()
        .unwrap_or(9600);
    let read_timeout_ms: u64 = env::var("READ_TIMEOUT_MS")
        .unwrap_or_else(|_| "2000".to_string())
        .parse()
        .unwrap_or(2000);
    let database_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "tempidity.db".to_string());
    let http_addr = env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting Tempidity recorder");
    info!("Sensor: {} at {} baud", serial_port, baud_rate);
    info!("HTTP server: {}", http_addr);
    info!("Database: {}", database_path);

    // Initialize metrics
    metrics::init_metrics();

    let store = match store::Store::open(&database_path).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let sensor_config = SensorConfig {
        port: serial_port,
        baud_rate,
        read_timeout: Duration::from_millis(read_timeout_ms),
    };
    let controller = Arc::new(Controller::new(
        SerialChannel::new(sensor_config),
        store.clone(),
        RecorderSettings::default(),
    ));

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(Arc::clone(&controller), store.clone()));

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", http_addr, e);
            std::process::exit(1);
        });

    info!("HTTP server listening on {}", http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    tokio::select! {
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    if let Err(e) = controller.stop_recording().await {
        error!("Recording task ended with error: {}", e);
    }
    store.close().await;

    info!("Shutting down");
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
