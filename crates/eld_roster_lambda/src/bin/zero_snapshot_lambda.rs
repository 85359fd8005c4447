use std::sync::Arc;

use eld_roster_lambda::adapters::object_store::S3SnapshotStore;
use eld_roster_lambda::adapters::zero::ZeroClient;
use eld_roster_lambda::handlers::http::{error_response, ApiGatewayResponse};
use eld_roster_lambda::handlers::zero::{handle_zero_event, ZeroPipelineDeps};
use eld_roster_lambda::runtime::config::{StorageConfig, ZeroConfig};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

async fn handle_request(event: LambdaEvent<Value>) -> Result<ApiGatewayResponse, Error> {
    let zero_config = match ZeroConfig::from_env() {
        Ok(config) => config,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };
    let storage_config = match StorageConfig::from_env() {
        Ok(config) => config,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };

    let api = match ZeroClient::new(&zero_config) {
        Ok(client) => client,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = ZeroPipelineDeps {
        api: Arc::new(api),
        store: Arc::new(S3SnapshotStore::new(
            storage_config.bucket,
            aws_sdk_s3::Client::new(&aws_config),
        )),
    };

    Ok(handle_zero_event(event.payload, &deps).await)
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
