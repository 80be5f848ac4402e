use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::StoreError;
use crate::model::Attributes;
use crate::store::{item_key, ItemStore};

/// A DynamoDB table with a string partition key.
#[derive(Debug, Clone)]
pub struct DynamoTable {
    client: ddb::Client,
    table_name: String,
    key_name: String,
}

impl DynamoTable {
    pub fn new(client: ddb::Client, table_name: impl Into<String>, key_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            key_name: key_name.to_string(),
        }
    }

    fn key(&self, key: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([(self.key_name.clone(), AttributeValue::S(key.to_string()))])
    }
}

#[async_trait]
impl ItemStore for DynamoTable {
    fn key_name(&self) -> &str {
        &self.key_name
    }

    async fn get(&self, key: &str) -> Result<Option<Attributes>, StoreError> {
        let output = self.client.get_item()
            .set_table_name(Some(self.table_name.clone()))
            .set_key(Some(self.key(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::storage("get_item", e))?;
        Ok(output.item().map(from_item))
    }

    async fn put_if_absent(&self, item: Attributes) -> Result<bool, StoreError> {
        item_key(self, &item)?;
        let result = self.client.put_item()
            .set_table_name(Some(self.table_name.clone()))
            .set_item(Some(to_item(&item)))
            .set_condition_expression(Some(String::from("attribute_not_exists(#key)")))
            .set_expression_attribute_names(Some(HashMap::from([
                (String::from("#key"), self.key_name.clone())
            ])))
            .send()
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().map_or(false, |se| se.is_conditional_check_failed_exception()) => {
                debug!(table = %self.table_name, "conditional put skipped, item exists");
                Ok(false)
            }
            Err(e) => Err(StoreError::storage("put_item", e)),
        }
    }

    async fn put(&self, item: Attributes) -> Result<(), StoreError> {
        item_key(self, &item)?;
        self.client.put_item()
            .set_table_name(Some(self.table_name.clone()))
            .set_item(Some(to_item(&item)))
            .send()
            .await
            .map_err(|e| StoreError::storage("put_item", e))?;
        Ok(())
    }

    async fn set_attribute(&self, key: &str, name: &str, value: Value) -> Result<(), StoreError> {
        let result = self.client.update_item()
            .set_table_name(Some(self.table_name.clone()))
            .set_key(Some(self.key(key)))
            .set_update_expression(Some(String::from("SET #attr = :value")))
            .set_condition_expression(Some(String::from("attribute_exists(#key)")))
            .set_expression_attribute_names(Some(HashMap::from([
                (String::from("#attr"), name.to_string()),
                (String::from("#key"), self.key_name.clone()),
            ])))
            .set_expression_attribute_values(Some(HashMap::from([
                (String::from(":value"), to_attribute_value(&value))
            ])))
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().map_or(false, |se| se.is_conditional_check_failed_exception()) => {
                Err(StoreError::NotFound(format!("{} item {}", self.table_name, key)))
            }
            Err(e) => Err(StoreError::storage("update_item", e)),
        }
    }

    async fn scan(&self) -> Result<Vec<Attributes>, StoreError> {
        let mut pages = self.client.scan()
            .set_table_name(Some(self.table_name.clone()))
            .into_paginator()
            .send();
        let mut items = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StoreError::storage("scan", e))?;
            items.extend(page.items().iter().map(from_item));
        }
        Ok(items)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client.delete_item()
            .set_table_name(Some(self.table_name.clone()))
            .set_key(Some(self.key(key)))
            .send()
            .await
            .map_err(|e| StoreError::storage("delete_item", e))?;
        Ok(())
    }
}

pub fn to_item(attributes: &Attributes) -> HashMap<String, AttributeValue> {
    attributes.iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

pub fn from_item(item: &HashMap<String, AttributeValue>) -> Attributes {
    item.iter()
        .map(|(k, v)| (k.clone(), from_attribute_value(v)))
        .collect()
}

pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(to_item(map)),
    }
}

pub fn from_attribute_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(values) => Value::Array(values.iter().map(from_attribute_value).collect()),
        AttributeValue::M(map) => Value::Object(from_item(map)),
        AttributeValue::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(values) => Value::Array(values.iter().map(|n| parse_number(n)).collect()),
        other => {
            debug!("unsupported attribute value {:?}", other);
            Value::Null
        }
    }
}

fn parse_number(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::Number(i.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(n.to_string()))
}
