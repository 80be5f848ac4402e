use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{vehicle_stub, Attributes};
use crate::store::ItemStore;

/// Returns the truck registered under `vin`, registering a stub first when
/// the VIN has never been seen. Existing entries are never modified.
pub async fn ensure_vehicle(trucks: &dyn ItemStore, vin: &str) -> Result<Attributes, StoreError> {
    if let Some(existing) = trucks.get(vin).await? {
        debug!(vin, "truck already registered");
        return Ok(existing);
    }

    info!(vin, "no truck registered, creating stub");
    let stub = vehicle_stub(vin);
    if trucks.put_if_absent(stub.clone()).await? {
        return Ok(stub);
    }

    // Lost a race with another writer; theirs is the record of truth.
    debug!(vin, "truck registered concurrently");
    Ok(trucks.get(vin).await?.unwrap_or(stub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTable;
    use crate::model::VIN_KEY;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_creates_stub_once() {
        let trucks = MemoryTable::new(VIN_KEY);
        let first = ensure_vehicle(&trucks, "E98123").await.unwrap();
        let second = ensure_vehicle(&trucks, "E98123").await.unwrap();
        assert_eq!(Value::Object(first), json!({"currentVin": "E98123"}));
        assert_eq!(Value::Object(second), json!({"currentVin": "E98123"}));
        assert_eq!(trucks.len(), 1);
    }

    #[tokio::test]
    async fn test_existing_truck_untouched() {
        let trucks = MemoryTable::new(VIN_KEY);
        let described = json!({"currentVin": "E98123", "originalVin": "E98120", "engine": "DD15"});
        trucks.put(described.as_object().unwrap().clone()).await.unwrap();

        let found = ensure_vehicle(&trucks, "E98123").await.unwrap();
        assert_eq!(Value::Object(found), described);
        assert_eq!(Value::Object(trucks.item("E98123").unwrap()), described);
    }

    #[tokio::test]
    async fn test_lost_race_returns_winner() {
        let trucks = MemoryTable::new(VIN_KEY);
        let winner = json!({"currentVin": "E98123", "originalVin": "E98120"});
        trucks.put(winner.as_object().unwrap().clone()).await.unwrap();
        // the first lookup runs before the other writer lands
        trucks.miss_next_gets(1);

        let found = ensure_vehicle(&trucks, "E98123").await.unwrap();
        assert_eq!(Value::Object(found), winner);
        assert_eq!(trucks.len(), 1);
        assert_eq!(Value::Object(trucks.item("E98123").unwrap()), winner);
    }

    #[tokio::test]
    async fn test_lookup_does_not_need_writes() {
        let trucks = MemoryTable::new(VIN_KEY);
        trucks.put(vehicle_stub("E90001")).await.unwrap();
        trucks.fail_writes(true);
        assert!(ensure_vehicle(&trucks, "E90001").await.is_ok());
        assert!(ensure_vehicle(&trucks, "E90002").await.is_err());
    }
}
