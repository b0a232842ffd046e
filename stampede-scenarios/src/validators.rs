//! Response validators
//!
//! Predicates inspect parsed JSON. Composite validators record every
//! predicate as its own check: the status check first, then the structural
//! checks, none of them short-circuiting the others. A body that does not
//! parse records every structural check as failed.

use serde_json::Value as JsonValue;
use stampede_http::RequestOutcome;
use stampede_runtime::VuContext;
use std::fmt;
use tracing::warn;

use crate::data::PRODUCT_FIELDS;

/// Upper bound on `items` in a list response
pub const MAX_LIST_ITEMS: usize = 100;

/// Field types checked on every product
pub const PRODUCT_FIELD_TYPES: &[(&str, JsonType)] =
    &[("name", JsonType::String), ("price", JsonType::Number)];

/// Runtime type tag of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Bool,
    Number,
    String,
    /// JSON arrays only; objects never match
    Array,
    Object,
}

impl JsonType {
    pub fn of(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => JsonType::Null,
            JsonValue::Bool(_) => JsonType::Bool,
            JsonValue::Number(_) => JsonType::Number,
            JsonValue::String(_) => JsonType::String,
            JsonValue::Array(_) => JsonType::Array,
            JsonValue::Object(_) => JsonType::Object,
        }
    }

    pub fn matches(&self, value: &JsonValue) -> bool {
        JsonType::of(value) == *self
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonType::Null => "null",
            JsonType::Bool => "boolean",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        };
        f.write_str(name)
    }
}

pub fn items_is_array(body: &JsonValue) -> bool {
    body.get("items").is_some_and(JsonValue::is_array)
}

pub fn items_not_empty(body: &JsonValue) -> bool {
    items(body).is_some_and(|items| !items.is_empty())
}

pub fn items_within_limit(body: &JsonValue, max_items: usize) -> bool {
    items(body).is_some_and(|items| items.len() <= max_items)
}

/// `items` is an array holding between 1 and [`MAX_LIST_ITEMS`] entries
pub fn is_list_shape(body: &JsonValue) -> bool {
    items_is_array(body) && items_not_empty(body) && items_within_limit(body, MAX_LIST_ITEMS)
}

pub fn has_required_fields(item: &JsonValue, fields: &[&str]) -> bool {
    item.as_object()
        .is_some_and(|object| fields.iter().all(|field| object.contains_key(*field)))
}

pub fn has_field_types(item: &JsonValue, fields: &[(&str, JsonType)]) -> bool {
    fields.iter().all(|(field, expected)| {
        item.get(*field)
            .is_some_and(|value| expected.matches(value))
    })
}

/// Both product shape predicates on a single item
pub fn is_product(item: &JsonValue) -> bool {
    has_required_fields(item, PRODUCT_FIELDS) && has_field_types(item, PRODUCT_FIELD_TYPES)
}

fn items(body: &JsonValue) -> Option<&Vec<JsonValue>> {
    body.get("items").and_then(JsonValue::as_array)
}

/// Record `names` as checks with the results of `evaluate` over the parsed
/// body, or as failed when the body is not JSON
fn record_structure<const N: usize>(
    ctx: &VuContext,
    outcome: &RequestOutcome,
    names: [&str; N],
    evaluate: impl FnOnce(&JsonValue) -> [bool; N],
) -> bool {
    let results = match outcome.json() {
        Ok(body) => evaluate(&body),
        Err(e) => {
            warn!(
                "{} {} returned a body that is not JSON ({}): {}",
                outcome.method,
                outcome.url,
                e,
                outcome.body_preview(200)
            );
            [false; N]
        }
    };

    let mut all_passed = true;
    for (name, passed) in names.iter().zip(results) {
        all_passed &= ctx.check(name, passed);
    }
    all_passed
}

/// GET list: 200, list shape, product shape on every item
pub fn validate_list(ctx: &VuContext, outcome: &RequestOutcome, max_items: usize) -> bool {
    let status_ok = ctx.check("list status is 200", outcome.status == 200);
    let structure_ok = record_structure(
        ctx,
        outcome,
        [
            "items is array",
            "items not empty",
            "items within page limit",
            "items have required fields",
            "items have valid field types",
        ],
        |body| {
            let list = items(body).map(Vec::as_slice).unwrap_or_default();
            [
                items_is_array(body),
                items_not_empty(body),
                items_within_limit(body, max_items),
                list.iter()
                    .all(|item| has_required_fields(item, PRODUCT_FIELDS)),
                list.iter()
                    .all(|item| has_field_types(item, PRODUCT_FIELD_TYPES)),
            ]
        },
    );
    status_ok && structure_ok
}

/// GET detail: 200 and a product body; 404 fails
pub fn validate_item(ctx: &VuContext, outcome: &RequestOutcome) -> bool {
    let status_ok = ctx.check("details status is 200", outcome.status == 200);
    let structure_ok = record_structure(
        ctx,
        outcome,
        ["item has required fields", "item has valid field types"],
        |body| {
            [
                has_required_fields(body, PRODUCT_FIELDS),
                has_field_types(body, PRODUCT_FIELD_TYPES),
            ]
        },
    );
    status_ok && structure_ok
}

/// POST: 200 or 201 and the created item carries an `id`
pub fn validate_created(ctx: &VuContext, outcome: &RequestOutcome) -> bool {
    let status_ok = ctx.check(
        "create status is 200 or 201",
        matches!(outcome.status, 200 | 201),
    );
    let structure_ok = record_structure(
        ctx,
        outcome,
        ["created item has id", "created item has required fields"],
        |body| {
            [
                body.get("id").is_some_and(|id| !id.is_null()),
                has_required_fields(body, PRODUCT_FIELDS),
            ]
        },
    );
    status_ok && structure_ok
}

/// PUT: 200 and the response echoes `field` with the submitted value
pub fn validate_updated(
    ctx: &VuContext,
    outcome: &RequestOutcome,
    field: &str,
    expected: &JsonValue,
) -> bool {
    let status_ok = ctx.check("update status is 200", outcome.status == 200);
    let structure_ok = record_structure(ctx, outcome, ["update echoes changes"], |body| {
        [body.get(field) == Some(expected)]
    });
    status_ok && structure_ok
}

/// DELETE: 200 or 204
pub fn validate_deleted(ctx: &VuContext, outcome: &RequestOutcome) -> bool {
    ctx.check(
        "delete status is 200 or 204",
        matches!(outcome.status, 200 | 204),
    )
}

/// GET after DELETE: 404
pub fn validate_not_found(ctx: &VuContext, outcome: &RequestOutcome) -> bool {
    ctx.check("deleted item returns 404", outcome.is_not_found())
}

/// Invalid POST: a 4xx whose body names the problem
pub fn validate_rejected(ctx: &VuContext, outcome: &RequestOutcome) -> bool {
    let status_ok = ctx.check("invalid payload rejected with 4xx", outcome.is_client_error());
    let structure_ok = record_structure(ctx, outcome, ["rejection has error or message"], |body| {
        [body.get("error").is_some() || body.get("message").is_some()]
    });
    status_ok && structure_ok
}
