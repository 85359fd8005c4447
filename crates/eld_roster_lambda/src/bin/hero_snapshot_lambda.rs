use std::sync::Arc;

use eld_roster_lambda::adapters::hero::HeroClient;
use eld_roster_lambda::adapters::object_store::S3SnapshotStore;
use eld_roster_lambda::handlers::hero::{handle_hero_event, HeroPipelineDeps};
use eld_roster_lambda::handlers::http::{error_response, ApiGatewayResponse};
use eld_roster_lambda::runtime::config::{HeroConfig, StorageConfig};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

async fn handle_request(event: LambdaEvent<Value>) -> Result<ApiGatewayResponse, Error> {
    let hero_config = match HeroConfig::from_env() {
        Ok(config) => config,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };
    let storage_config = match StorageConfig::from_env() {
        Ok(config) => config,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };

    let api = match HeroClient::new(&hero_config) {
        Ok(client) => client,
        Err(error) => return Ok(misconfiguration_response(&error.to_string())),
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = HeroPipelineDeps {
        api: Arc::new(api),
        store: Arc::new(S3SnapshotStore::new(
            storage_config.bucket,
            aws_sdk_s3::Client::new(&aws_config),
        )),
        excluded_company_ids: hero_config.excluded_company_ids,
    };

    Ok(handle_hero_event(event.payload, &deps).await)
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
