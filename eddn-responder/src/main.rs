//! Read journal events and CAPI refreshes from stdin, one JSON document per line, and upload
//! whatever they produce to EDDN.
use std::sync::Arc;

use anyhow::Error;
use eddn_common::metrics::{serve, setup_metrics_router};
use eddn_responder::config::Config;
use eddn_responder::responder::Responder;
use eddn_responder::sender::{run_uploader, HttpSink, PrintSink, UploadSink};
use envconfig::Envconfig;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let config = Config::init_from_env()?;

    if config.export_prometheus {
        let router = setup_metrics_router()?;
        let bind = config.bind();
        tokio::task::spawn(async move {
            if let Err(error) = serve(router, &bind).await {
                warn!("failed to serve metrics: {}", error);
            }
        });
    }

    let sink: Arc<dyn UploadSink> = if config.print_sink {
        Arc::new(PrintSink {})
    } else {
        Arc::new(HttpSink::new(
            &config.upload_url,
            config.request_timeout.0,
        )?)
    };

    let (queue, receiver) = mpsc::unbounded_channel();
    let uploader = tokio::task::spawn(run_uploader(receiver, config.identity(), sink));

    let responder = Responder::with_default_schemas(queue);
    info!("reading events from stdin");

    let queued = responder
        .handle_input(BufReader::new(tokio::io::stdin()))
        .await;

    // Closing the queue lets the uploader finish what is already queued
    drop(responder);
    uploader.await?;

    info!(queued, "input closed, exiting");
    Ok(())
}
