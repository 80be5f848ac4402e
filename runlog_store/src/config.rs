use std::env;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_dynamodb as ddb;
use aws_sdk_s3 as s3;

use crate::error::ConfigError;

pub const TRUCKS_TABLE_NAME: &str = "TRUCKS_TABLE_NAME";
pub const RECORDS_TABLE_NAME: &str = "RECORDS_TABLE_NAME";
pub const CSV_BUCKET: &str = "CSV_BUCKET";
pub const MAPS_BUCKET: &str = "MAPS_BUCKET";
pub const DYNAMODB_ENDPOINT: &str = "DYNAMODB_ENDPOINT";
pub const S3_ENDPOINT: &str = "S3_ENDPOINT";

pub fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVariable(name))
}

pub async fn load_sdk_config() -> SdkConfig {
    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

pub fn dynamodb_client(config: &SdkConfig) -> ddb::Client {
    let ddb_config = match env::var(DYNAMODB_ENDPOINT) {
        Ok(endpoint) => ddb::config::Builder::from(config).endpoint_url(endpoint).build(),
        _ => ddb::config::Builder::from(config).build(),
    };
    ddb::Client::from_conf(ddb_config)
}

pub fn s3_client(config: &SdkConfig) -> s3::Client {
    let s3_config = match env::var(S3_ENDPOINT) {
        // local stand-ins (localstack, minio) only speak path-style
        Ok(endpoint) => s3::config::Builder::from(config)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build(),
        _ => s3::config::Builder::from(config).build(),
    };
    s3::Client::from_conf(s3_config)
}
