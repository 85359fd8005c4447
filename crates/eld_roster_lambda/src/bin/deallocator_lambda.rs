use std::sync::Arc;
use std::time::Duration;

use eld_roster_lambda::adapters::allocation_table::PostgrestTable;
use eld_roster_lambda::adapters::object_store::S3SnapshotStore;
use eld_roster_lambda::handlers::allocator::{handle_deallocator_event, AllocatorDeps};
use eld_roster_lambda::handlers::http::{error_response, ApiGatewayResponse};
use eld_roster_lambda::runtime::config::AllocatorConfig;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

async fn handle_request(event: LambdaEvent<Value>) -> Result<ApiGatewayResponse, Error> {
    let config = match AllocatorConfig::from_env() {
        Ok(config) => config,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };

    let http = match reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
    {
        Ok(client) => client,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = AllocatorDeps {
        store: Arc::new(S3SnapshotStore::new(
            config.bucket,
            aws_sdk_s3::Client::new(&aws_config),
        )),
        table: Arc::new(PostgrestTable::new(http, config.api_url, config.api_key)),
    };

    Ok(handle_deallocator_event(event.payload, &deps).await)
}

fn misconfiguration_response(message: &str) -> ApiGatewayResponse {
    error_response(
        500,
        json!({
            "error": "misconfiguration",
            "message": message,
        }),
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}
