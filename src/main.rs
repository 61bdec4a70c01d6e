use std::sync::Arc;

use lambda_http::{run, service_fn, Error, Request};
use tracing::info;

use northgate_site_api::assets::S3Assets;
use northgate_site_api::session::MemorySessions;
use northgate_site_api::store::{Collections, DynamoKv};
use northgate_site_api::{handle_request, AppState};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    info!("Starting northgate-site-api");

    // Load AWS configuration
    let config = aws_config::load_from_env().await;

    // Get environment variables
    let table_name = std::env::var("TABLE_NAME").expect("TABLE_NAME must be set");
    let asset_bucket = std::env::var("ASSET_BUCKET").expect("ASSET_BUCKET must be set");

    info!("Configuration loaded:");
    info!("  Table: {}", table_name);
    info!("  Asset bucket: {}", asset_bucket);

    // Initialize AWS clients
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);
    let s3_client = aws_sdk_s3::Client::new(&config);

    // Sessions are process-local: a restart logs every panel user out.
    let state = AppState {
        collections: Collections::new(Arc::new(DynamoKv::new(dynamodb_client, table_name))),
        sessions: Arc::new(MemorySessions::default()),
        assets: Arc::new(S3Assets::new(s3_client, asset_bucket)),
    };

    info!("Services initialized successfully");

    run(service_fn(|event: Request| async {
        handle_request(event, &state).await
    }))
    .await
}
