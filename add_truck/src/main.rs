use add_truck::{function_handler, Config};
use lambda_http::{run, service_fn, Error, Request};
use runlog_store::config::{dynamodb_client, load_sdk_config};
use runlog_store::dynamo::DynamoTable;
use runlog_store::model::VIN_KEY;

const TRACE_DEBUG: &str = "TRACE_DEBUG";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(match std::env::var(TRACE_DEBUG) {
            Ok(_) => tracing::Level::DEBUG,
            Err(_) => tracing::Level::INFO
        })
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let config = Config::from_env()?;
    let sdk_config = load_sdk_config().await;
    let trucks = DynamoTable::new(dynamodb_client(&sdk_config), config.trucks_table, VIN_KEY);

    run(service_fn(|event: Request| function_handler(event, &trucks))).await
}
