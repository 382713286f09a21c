//! In-memory document transform.
//!
//! Inspectors name operations through `summary`, while client generators
//! key off `operationId` and generate poor names for inline schemas. This
//! pass copies one into the other and moves inline body schemas into
//! `components.schemas` under names derived from the operation.

use serde_json::{json, Map, Value};

use crate::types::{FormatOptions, FormatReport, HoistedSchema, SuffixScheme};
use crate::FormatError;

/// Path item keys that hold operations.
pub const OPERATION_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

struct Extracted {
    name: String,
    location: String,
    schema: Value,
}

/// Rewrite `doc` in place.
///
/// The document is checked for shape before anything is modified, so an
/// `Err` leaves it untouched.
pub fn format_document(
    doc: &mut Value,
    options: &FormatOptions,
) -> Result<FormatReport, FormatError> {
    validate_shape(doc)?;
    let Some(root) = doc.as_object_mut() else {
        return Err(invalid("document root is not an object"));
    };

    let mut report = FormatReport::default();
    let mut extracted = Vec::new();

    if let Some(paths) = root.get_mut("paths").and_then(Value::as_object_mut) {
        for (path, item) in paths.iter_mut() {
            let Some(item) = item.as_object_mut() else {
                continue;
            };
            for method in OPERATION_METHODS {
                let Some(operation) = item.get_mut(method).and_then(Value::as_object_mut) else {
                    continue;
                };
                let label = format!("{} {}", method.to_uppercase(), path);
                let Some(operation_id) = assign_operation_id(operation, &label, &mut report) else {
                    continue;
                };
                let location = format!("paths.{path}.{method}");

                let responses = operation
                    .get_mut("responses")
                    .and_then(Value::as_object_mut);
                if let Some(responses) = responses {
                    for (code, response) in responses.iter_mut() {
                        // `$ref` responses carry no content and fall through here.
                        let content = response.get_mut("content").and_then(Value::as_object_mut);
                        if let Some(content) = content {
                            hoist_content(
                                content,
                                &format!("{operation_id}_{code}_Response"),
                                &format!("{location}.responses.{code}"),
                                options.suffix,
                                &mut extracted,
                            );
                        }
                    }
                }

                if let Some(content) = operation
                    .get_mut("requestBody")
                    .and_then(|body| body.get_mut("content"))
                    .and_then(Value::as_object_mut)
                {
                    hoist_content(
                        content,
                        &format!("{operation_id}_Request"),
                        &format!("{location}.requestBody"),
                        options.suffix,
                        &mut extracted,
                    );
                }
            }
        }
    }

    if !extracted.is_empty() {
        let schemas = component_schemas(root)?;
        for Extracted { name, location, schema } in extracted {
            let replaced = schemas.insert(name.clone(), schema).is_some();
            report.hoisted.push(HoistedSchema {
                name,
                location,
                replaced,
            });
        }
    }

    Ok(report)
}

fn invalid(reason: impl Into<String>) -> FormatError {
    FormatError::InvalidDocument(reason.into())
}

fn validate_shape(doc: &Value) -> Result<(), FormatError> {
    let Some(root) = doc.as_object() else {
        return Err(invalid("document root is not an object"));
    };
    if let Some(paths) = root.get("paths") {
        if !paths.is_object() {
            return Err(invalid("`paths` is not an object"));
        }
    }
    if let Some(components) = root.get("components") {
        let Some(components) = components.as_object() else {
            return Err(invalid("`components` is not an object"));
        };
        if components.get("schemas").is_some_and(|s| !s.is_object()) {
            return Err(invalid("`components.schemas` is not an object"));
        }
    }
    Ok(())
}

fn component_schemas(
    root: &mut Map<String, Value>,
) -> Result<&mut Map<String, Value>, FormatError> {
    root.entry("components")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| invalid("`components` is not an object"))?
        .entry("schemas")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| invalid("`components.schemas` is not an object"))
}

/// Copy `summary` into `operationId` and return the id to name schemas by.
fn assign_operation_id(
    operation: &mut Map<String, Value>,
    label: &str,
    report: &mut FormatReport,
) -> Option<String> {
    let summary = operation
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    match summary {
        Some(summary) => {
            let previous =
                operation.insert("operationId".to_string(), Value::String(summary.clone()));
            if previous.as_ref().and_then(Value::as_str) != Some(summary.as_str()) {
                report
                    .renamed_operations
                    .push((label.to_string(), summary.clone()));
            }
            Some(summary)
        }
        None => match operation.get("operationId").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => {
                report.unnamed_operations.push(label.to_string());
                None
            }
        },
    }
}

fn is_ref(schema: &Value) -> bool {
    schema.get("$ref").is_some()
}

/// Replace each inline schema in a `content` map with a component `$ref`.
///
/// Array schemas keep their shape; their `items` schema is hoisted.
fn hoist_content(
    content: &mut Map<String, Value>,
    base: &str,
    location: &str,
    suffix: SuffixScheme,
    out: &mut Vec<Extracted>,
) {
    let media_types = content.len();
    let mut nth = 0;

    for (media_type, media) in content.iter_mut() {
        let Some(schema) = media.get_mut("schema") else {
            continue;
        };
        if is_ref(schema) {
            continue;
        }
        let target = if schema.get("items").is_some() {
            &mut schema["items"]
        } else {
            schema
        };
        if is_ref(target) {
            continue;
        }

        let name = suffix.name(base, nth, media_types);
        nth += 1;
        let reference = json!({ "$ref": format!("{SCHEMA_REF_PREFIX}{name}") });
        out.push(Extracted {
            location: format!("{location}.{media_type}"),
            schema: std::mem::replace(target, reference),
            name,
        });
    }
}
