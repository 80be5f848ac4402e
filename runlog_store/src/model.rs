use serde_json::{Map, Value};

use crate::filename::TelemetryFilename;

/// A stored item: attribute name to JSON-like value.
pub type Attributes = Map<String, Value>;

/// Partition key of the trucks table.
pub const VIN_KEY: &str = "currentVin";
/// Partition key of the records table.
pub const FILENAME_KEY: &str = "filename";
pub const DATE_ATTR: &str = "date";
pub const DATA_FILENAME_ATTR: &str = "data_filename";
pub const MAP_ATTR: &str = "map";

/// The placeholder written for a VIN seen in a telemetry file before anyone
/// described the truck.
pub fn vehicle_stub(vin: &str) -> Attributes {
    let mut item = Attributes::new();
    item.insert(VIN_KEY.to_string(), Value::String(vin.to_string()));
    item
}

/// Builds a telemetry record from the vehicle's attributes at ingest time.
/// The filename-derived fields win over any vehicle attribute of the same
/// name.
pub fn telemetry_record(vehicle: &Attributes, file: &TelemetryFilename) -> Attributes {
    let mut record = vehicle.clone();
    record.insert(VIN_KEY.to_string(), Value::String(file.vin.clone()));
    record.insert(
        DATE_ATTR.to_string(),
        Value::String(file.date.format("%Y-%m-%d").to_string()),
    );
    record.insert(FILENAME_KEY.to_string(), Value::String(file.filename.clone()));
    record.insert(
        DATA_FILENAME_ATTR.to_string(),
        Value::String(file.data_filename.clone()),
    );
    record
}

/// Reads a string attribute, ignoring values of any other type.
pub fn string_attr<'a>(item: &'a Attributes, name: &str) -> Option<&'a str> {
    item.get(name).and_then(Value::as_str)
}
