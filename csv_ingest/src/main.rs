use csv_ingest::{function_handler, Config};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use aws_lambda_events::event::s3::S3Event;
use runlog_store::config::{dynamodb_client, load_sdk_config};
use runlog_store::dynamo::DynamoTable;
use runlog_store::model::{FILENAME_KEY, VIN_KEY};

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
    let ddb_client = dynamodb_client(&sdk_config);
    let trucks = DynamoTable::new(ddb_client.clone(), config.trucks_table, VIN_KEY);
    let records = DynamoTable::new(ddb_client, config.records_table, FILENAME_KEY);

    run(service_fn(|event: LambdaEvent<S3Event>| function_handler(event, &trucks, &records))).await
}
