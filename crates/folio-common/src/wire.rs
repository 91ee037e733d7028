//! JSON persistence shapes.
//!
//! A body is stored as a JSON array (flat blocks) or a JSON object (tree
//! rooted at a `Doc`). Both shapes round-trip exactly through
//! [`parse_body`] / [`body_to_string`].

use serde_json::Value;

use crate::document::{Body, Document};
use crate::error::WireError;

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decide the content model from the JSON shape and decode it.
pub fn body_from_value(value: Value) -> Result<Body, WireError> {
    match value {
        Value::Array(_) => Ok(Body::Blocks(serde_json::from_value(value)?)),
        Value::Object(_) => Ok(Body::Tree(serde_json::from_value(value)?)),
        other => Err(WireError::UnexpectedShape {
            found: shape_of(&other),
        }),
    }
}

pub fn body_to_value(body: &Body) -> Result<Value, WireError> {
    Ok(serde_json::to_value(body)?)
}

pub fn parse_body(json: &str) -> Result<Body, WireError> {
    let value: Value = serde_json::from_str(json)?;
    let body = body_from_value(value)?;
    tracing::trace!(target: "folio::wire", shape = body.shape_name(), "parsed body");
    Ok(body)
}

pub fn body_to_string(body: &Body) -> Result<String, WireError> {
    Ok(serde_json::to_string(body)?)
}

pub fn parse_document(json: &str) -> Result<Document, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn document_to_string(document: &Document) -> Result<String, WireError> {
    Ok(serde_json::to_string(document)?)
}
