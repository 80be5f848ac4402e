use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use map_render::{function_handler, Config, RecordStreamEvent, Stores};
use runlog_store::config::{dynamodb_client, load_sdk_config, s3_client};
use runlog_store::dynamo::DynamoTable;
use runlog_store::model::FILENAME_KEY;
use runlog_store::s3::S3Bucket;

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
    let s3 = s3_client(&sdk_config);
    let sources = S3Bucket::new(s3.clone(), config.csv_bucket);
    let maps = S3Bucket::new(s3, config.maps_bucket);
    let records = DynamoTable::new(dynamodb_client(&sdk_config), config.records_table, FILENAME_KEY);
    let stores = Stores {
        sources: &sources,
        maps: &maps,
        records: &records,
    };

    run(service_fn(|event: LambdaEvent<RecordStreamEvent>| function_handler(event, &stores))).await
}
