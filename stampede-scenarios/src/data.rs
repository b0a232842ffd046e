//! Request payloads for the products resource

use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

const CATEGORIES: &[&str] = &["electronics", "books", "garden", "toys", "grocery"];

/// Fields every product item must carry
pub const PRODUCT_FIELDS: &[&str] = &["id", "name", "price"];

/// Random price with two decimals in `[1.00, 1000.00)`
fn price() -> f64 {
    fastrand::u32(100..100_000) as f64 / 100.0
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Valid create payload with a unique name and SKU
pub fn product_payload() -> JsonValue {
    let id = short_id();
    json!({
        "name": format!("Load Test Product {}", id),
        "description": "Created by a stampede load test",
        "price": price(),
        "category": CATEGORIES[fastrand::usize(..CATEGORIES.len())],
        "sku": format!("LT-{}", id.to_uppercase()),
        "stock": fastrand::u32(0..500),
    })
}

/// Payload the API must reject
pub fn invalid_product_payload() -> JsonValue {
    json!({})
}

/// Update for an existing product: the snapshot with a new name and price
pub fn update_payload(snapshot: Option<&JsonValue>) -> JsonValue {
    let mut payload = match snapshot {
        Some(JsonValue::Object(fields)) => JsonValue::Object(fields.clone()),
        _ => product_payload(),
    };
    if let JsonValue::Object(fields) = &mut payload {
        fields.remove("id");
        fields.insert(
            "name".to_string(),
            JsonValue::String(format!("Updated Product {}", short_id())),
        );
        fields.insert("price".to_string(), json!(price()));
    }
    payload
}

/// Path segment for an id returned by the API
pub fn id_segment(id: &JsonValue) -> Option<String> {
    match id {
        JsonValue::String(id) if !id.is_empty() => Some(id.clone()),
        JsonValue::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
