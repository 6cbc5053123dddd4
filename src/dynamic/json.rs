//! The canonical protobuf JSON mapping
//! (<https://protobuf.dev/programming-guides/proto3/#json>), built on top of
//! `serde_json::Value` as an intermediate form rather than a direct
//! `Serialize`/`Deserialize` implementation against `DynamicMessage`.

use base64::Engine;
use chrono::{SecondsFormat, TimeZone, Utc};

use crate::descriptor::{FieldDescriptor, Kind, MessageDescriptor};

use super::{DynamicMessage, MapKey, Value};

/// The well-known wrapper types, whose canonical JSON form is just their
/// single `value` field.
const WRAPPER_TYPES: &[&str] = &[
    "google.protobuf.DoubleValue",
    "google.protobuf.FloatValue",
    "google.protobuf.Int64Value",
    "google.protobuf.UInt64Value",
    "google.protobuf.Int32Value",
    "google.protobuf.UInt32Value",
    "google.protobuf.BoolValue",
    "google.protobuf.StringValue",
    "google.protobuf.BytesValue",
];

const ANY_TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// A failure to marshal or unmarshal a [`DynamicMessage`] to or from the
/// canonical JSON mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonError {
    /// Strict-mode decoding encountered a JSON object key with no
    /// corresponding field.
    UnknownField { name: String },
    /// The JSON input's shape didn't match what was expected at this point
    /// (e.g. an object where an array was required).
    InvalidFormat(String),
    /// A JSON value was well-formed but couldn't be coerced to the field's
    /// declared type.
    TypeMismatch { message: String },
    /// A numeric JSON value didn't fit the field's declared width.
    NumberOutOfRange,
    /// An enum field's JSON string didn't name a declared value, and the
    /// input wasn't a plain number either.
    UnknownEnumName { name: String },
    /// A `google.protobuf.Any` value named an `@type` that the pool backing
    /// the target descriptor has no record of. Per the open question this
    /// mirrors, an unresolved `@type` is treated as a hard failure rather
    /// than passed through opaquely.
    UnknownType { name: String },
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonError::UnknownField { name } => write!(f, "no field named '{}'", name),
            JsonError::InvalidFormat(message) => write!(f, "{}", message),
            JsonError::TypeMismatch { message } => write!(f, "{}", message),
            JsonError::NumberOutOfRange => write!(f, "number is out of range for the field type"),
            JsonError::UnknownEnumName { name } => {
                write!(f, "'{}' is not a declared enum value", name)
            }
            JsonError::UnknownType { name } => {
                write!(f, "no message type registered for '@type' value '{}'", name)
            }
        }
    }
}

impl std::error::Error for JsonError {}

/// Marshals `message` to a compact JSON string using the canonical mapping.
pub fn marshal(message: &DynamicMessage) -> Result<String, JsonError> {
    let value = to_json_value(message)?;
    serde_json::to_string(&value).map_err(|e| JsonError::InvalidFormat(e.to_string()))
}

/// Unmarshals `text` into a fresh message of `desc`'s type. Unknown object
/// keys are silently ignored.
pub fn unmarshal(desc: &MessageDescriptor, text: &str) -> Result<DynamicMessage, JsonError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| JsonError::InvalidFormat(e.to_string()))?;
    from_json_value(desc, &value, false)
}

/// Like [`unmarshal`], but rejects object keys with no corresponding field.
pub fn unmarshal_strict(desc: &MessageDescriptor, text: &str) -> Result<DynamicMessage, JsonError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| JsonError::InvalidFormat(e.to_string()))?;
    from_json_value(desc, &value, true)
}

fn to_json_value(message: &DynamicMessage) -> Result<serde_json::Value, JsonError> {
    match message.descriptor().full_name() {
        "google.protobuf.Timestamp" => return marshal_timestamp(message),
        "google.protobuf.Duration" => return marshal_duration(message),
        "google.protobuf.Any" => return marshal_any(message),
        "google.protobuf.Empty" => return Ok(serde_json::Value::Object(Default::default())),
        name if WRAPPER_TYPES.contains(&name) => return marshal_wrapper(message),
        _ => {}
    }

    let mut obj = serde_json::Map::new();
    for (field, value) in message.fields() {
        obj.insert(field.json_name().to_string(), marshal_field(&field, &value)?);
    }
    Ok(serde_json::Value::Object(obj))
}

fn marshal_field(field: &FieldDescriptor, value: &Value) -> Result<serde_json::Value, JsonError> {
    let kind = field.kind();
    if field.is_map() {
        let entry = kind.as_message().expect("map field is message-kind");
        let value_kind = entry
            .map_entry_value_field()
            .expect("map entry has a value field")
            .kind();
        let Value::Map(map) = value else {
            return Ok(serde_json::Value::Object(Default::default()));
        };
        let mut obj = serde_json::Map::new();
        for (k, v) in map {
            obj.insert(map_key_to_json(k), scalar_to_json(v, &value_kind)?);
        }
        Ok(serde_json::Value::Object(obj))
    } else if field.is_list() {
        let Value::List(items) = value else {
            return Ok(serde_json::Value::Array(Vec::new()));
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(scalar_to_json(item, &kind)?);
        }
        Ok(serde_json::Value::Array(out))
    } else {
        scalar_to_json(value, &kind)
    }
}

fn scalar_to_json(value: &Value, kind: &Kind) -> Result<serde_json::Value, JsonError> {
    Ok(match value {
        Value::Bool(v) => serde_json::Value::Bool(*v),
        Value::I32(v) => serde_json::json!(v),
        Value::I64(v) => serde_json::Value::String(v.to_string()),
        Value::U32(v) => serde_json::json!(v),
        Value::U64(v) => serde_json::Value::String(v.to_string()),
        Value::F32(v) => float_to_json(*v as f64),
        Value::F64(v) => float_to_json(*v),
        Value::String(v) => serde_json::Value::String(v.clone()),
        Value::Bytes(v) => {
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(v))
        }
        Value::EnumNumber(number) => {
            let Kind::Enum(enum_ty) = kind else {
                return Err(JsonError::TypeMismatch {
                    message: "enum value for a non-enum field".to_string(),
                });
            };
            match enum_ty.get_value_by_number(*number) {
                Some(v) => serde_json::Value::String(v.name().to_string()),
                None => serde_json::json!(number),
            }
        }
        Value::Message(m) => to_json_value(m)?,
        Value::List(_) | Value::Map(_) => {
            return Err(JsonError::TypeMismatch {
                message: "nested list/map values are not directly representable".to_string(),
            })
        }
    })
}

fn float_to_json(v: f64) -> serde_json::Value {
    if v.is_nan() {
        serde_json::Value::String("NaN".to_string())
    } else if v == f64::INFINITY {
        serde_json::Value::String("Infinity".to_string())
    } else if v == f64::NEG_INFINITY {
        serde_json::Value::String("-Infinity".to_string())
    } else {
        serde_json::json!(v)
    }
}

fn map_key_to_json(key: &MapKey) -> String {
    match key {
        MapKey::Bool(v) => v.to_string(),
        MapKey::I32(v) => v.to_string(),
        MapKey::I64(v) => v.to_string(),
        MapKey::U32(v) => v.to_string(),
        MapKey::U64(v) => v.to_string(),
        MapKey::String(v) => v.clone(),
    }
}

fn json_to_map_key(key: &str, kind: &Kind) -> Result<MapKey, JsonError> {
    let invalid = || JsonError::InvalidFormat(format!("'{}' is not a valid map key", key));
    Ok(match kind {
        Kind::Bool => MapKey::Bool(key.parse().map_err(|_| invalid())?),
        Kind::String => MapKey::String(key.to_string()),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            MapKey::I32(key.parse().map_err(|_| invalid())?)
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            MapKey::I64(key.parse().map_err(|_| invalid())?)
        }
        Kind::Uint32 | Kind::Fixed32 => MapKey::U32(key.parse().map_err(|_| invalid())?),
        Kind::Uint64 | Kind::Fixed64 => MapKey::U64(key.parse().map_err(|_| invalid())?),
        _ => {
            return Err(JsonError::TypeMismatch {
                message: "map key type is not a permitted map key kind".to_string(),
            })
        }
    })
}

fn from_json_value(
    desc: &MessageDescriptor,
    json: &serde_json::Value,
    strict: bool,
) -> Result<DynamicMessage, JsonError> {
    match desc.full_name() {
        "google.protobuf.Timestamp" => return unmarshal_timestamp(desc, json),
        "google.protobuf.Duration" => return unmarshal_duration(desc, json),
        "google.protobuf.Any" => return unmarshal_any(desc, json, strict),
        "google.protobuf.Empty" => return Ok(DynamicMessage::new(desc.clone())),
        name if WRAPPER_TYPES.contains(&name) => return unmarshal_wrapper(desc, json),
        _ => {}
    }

    let obj = json
        .as_object()
        .ok_or_else(|| JsonError::InvalidFormat("expected a JSON object".to_string()))?;

    let mut message = DynamicMessage::new(desc.clone());
    for (key, value) in obj {
        if value.is_null() {
            continue;
        }
        let Some(field) = desc.get_field_by_json_name(key) else {
            if strict {
                return Err(JsonError::UnknownField { name: key.clone() });
            } else {
                continue;
            }
        };
        set_field_from_json(&mut message, &field, value, strict)?;
    }
    Ok(message)
}

fn set_field_from_json(
    message: &mut DynamicMessage,
    field: &FieldDescriptor,
    value: &serde_json::Value,
    strict: bool,
) -> Result<(), JsonError> {
    let kind = field.kind();
    let type_mismatch = |e: crate::dynamic::MessageError| JsonError::TypeMismatch {
        message: e.to_string(),
    };

    if field.is_map() {
        let entry = kind.as_message().expect("map field is message-kind");
        let value_kind = entry
            .map_entry_value_field()
            .expect("map entry has a value field")
            .kind();
        let obj = value
            .as_object()
            .ok_or_else(|| JsonError::InvalidFormat("expected a JSON object for a map field".to_string()))?;
        let key_kind = entry
            .map_entry_key_field()
            .expect("map entry has a key field")
            .kind();
        for (k, v) in obj {
            let key = json_to_map_key(k, &key_kind)?;
            let scalar = json_to_scalar(v, &value_kind, strict)?;
            message
                .set_map_entry(field.number(), key, scalar)
                .map_err(type_mismatch)?;
        }
        return Ok(());
    }

    if field.is_list() {
        let items = value
            .as_array()
            .ok_or_else(|| JsonError::InvalidFormat("expected a JSON array for a repeated field".to_string()))?;
        for item in items {
            let scalar = json_to_scalar(item, &kind, strict)?;
            message
                .add_repeated(field.number(), scalar)
                .map_err(type_mismatch)?;
        }
        return Ok(());
    }

    let scalar = json_to_scalar(value, &kind, strict)?;
    message.set(field.number(), scalar).map_err(type_mismatch)
}

fn json_to_scalar(
    json: &serde_json::Value,
    kind: &Kind,
    strict: bool,
) -> Result<Value, JsonError> {
    Ok(match kind {
        Kind::Double => Value::F64(json_float(json)?),
        Kind::Float => Value::F32(json_float(json)? as f32),
        Kind::Bool => Value::Bool(json.as_bool().ok_or_else(|| JsonError::TypeMismatch {
            message: "expected a boolean".to_string(),
        })?),
        Kind::String => Value::String(
            json.as_str()
                .ok_or_else(|| JsonError::TypeMismatch {
                    message: "expected a string".to_string(),
                })?
                .to_string(),
        ),
        Kind::Bytes => {
            let s = json.as_str().ok_or_else(|| JsonError::TypeMismatch {
                message: "expected a base64 string".to_string(),
            })?;
            Value::Bytes(
                base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map_err(|e| JsonError::InvalidFormat(e.to_string()))?,
            )
        }
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            Value::I32(i32::try_from(json_i64(json)?).map_err(|_| JsonError::NumberOutOfRange)?)
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(json_i64(json)?),
        Kind::Uint32 | Kind::Fixed32 => {
            Value::U32(u32::try_from(json_u64(json)?).map_err(|_| JsonError::NumberOutOfRange)?)
        }
        Kind::Uint64 | Kind::Fixed64 => Value::U64(json_u64(json)?),
        Kind::Enum(e) => match json {
            serde_json::Value::String(name) => match e.get_value_by_name(name) {
                Some(v) => Value::EnumNumber(v.number()),
                None => {
                    return Err(JsonError::UnknownEnumName { name: name.clone() });
                }
            },
            serde_json::Value::Number(_) => Value::EnumNumber(
                i32::try_from(json_i64(json)?).map_err(|_| JsonError::NumberOutOfRange)?,
            ),
            _ => {
                return Err(JsonError::TypeMismatch {
                    message: "expected an enum name or number".to_string(),
                })
            }
        },
        Kind::Message(m) => Value::Message(from_json_value(m, json, strict)?),
    })
}

fn json_float(json: &serde_json::Value) -> Result<f64, JsonError> {
    match json {
        serde_json::Value::Number(n) => n.as_f64().ok_or(JsonError::NumberOutOfRange),
        serde_json::Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other
                .parse()
                .map_err(|_| JsonError::InvalidFormat(format!("'{}' is not a valid float", other))),
        },
        _ => Err(JsonError::TypeMismatch {
            message: "expected a number or float string".to_string(),
        }),
    }
}

fn json_i64(json: &serde_json::Value) -> Result<i64, JsonError> {
    match json {
        serde_json::Value::Number(n) => n.as_i64().ok_or(JsonError::NumberOutOfRange),
        serde_json::Value::String(s) => s
            .parse()
            .map_err(|_| JsonError::InvalidFormat(format!("'{}' is not a valid integer", s))),
        _ => Err(JsonError::TypeMismatch {
            message: "expected an integer or integer string".to_string(),
        }),
    }
}

fn json_u64(json: &serde_json::Value) -> Result<u64, JsonError> {
    match json {
        serde_json::Value::Number(n) => n.as_u64().ok_or(JsonError::NumberOutOfRange),
        serde_json::Value::String(s) => s
            .parse()
            .map_err(|_| JsonError::InvalidFormat(format!("'{}' is not a valid integer", s))),
        _ => Err(JsonError::TypeMismatch {
            message: "expected an integer or integer string".to_string(),
        }),
    }
}

fn marshal_timestamp(message: &DynamicMessage) -> Result<serde_json::Value, JsonError> {
    let seconds = message
        .get(1u32)
        .ok()
        .flatten()
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let nanos = message
        .get(2u32)
        .ok()
        .flatten()
        .and_then(|v| v.as_i32())
        .unwrap_or(0);
    let datetime = Utc
        .timestamp_opt(seconds, u32::try_from(nanos).map_err(|_| JsonError::NumberOutOfRange)?)
        .single()
        .ok_or(JsonError::NumberOutOfRange)?;
    Ok(serde_json::Value::String(
        datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ))
}

fn unmarshal_timestamp(
    desc: &MessageDescriptor,
    json: &serde_json::Value,
) -> Result<DynamicMessage, JsonError> {
    let s = json.as_str().ok_or_else(|| JsonError::InvalidFormat("expected an RFC 3339 timestamp string".to_string()))?;
    let datetime = chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| JsonError::InvalidFormat(e.to_string()))?;
    let mut message = DynamicMessage::new(desc.clone());
    message
        .set(1u32, Value::I64(datetime.timestamp()))
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    message
        .set(2u32, Value::I32(datetime.timestamp_subsec_nanos() as i32))
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    Ok(message)
}

fn marshal_duration(message: &DynamicMessage) -> Result<serde_json::Value, JsonError> {
    let seconds = message
        .get(1u32)
        .ok()
        .flatten()
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let nanos = message
        .get(2u32)
        .ok()
        .flatten()
        .and_then(|v| v.as_i32())
        .unwrap_or(0);
    Ok(serde_json::Value::String(if nanos == 0 {
        format!("{}s", seconds)
    } else {
        let sign = if seconds < 0 || nanos < 0 { "-" } else { "" };
        format!("{}{}.{:0>9}s", sign, seconds.unsigned_abs(), nanos.unsigned_abs())
    }))
}

fn unmarshal_duration(
    desc: &MessageDescriptor,
    json: &serde_json::Value,
) -> Result<DynamicMessage, JsonError> {
    let s = json.as_str().ok_or_else(|| JsonError::InvalidFormat("expected a duration string".to_string()))?;
    let s = s
        .strip_suffix('s')
        .ok_or_else(|| JsonError::InvalidFormat("duration string must end in 's'".to_string()))?;
    let (seconds, nanos) = match s.split_once('.') {
        Some((secs, frac)) => {
            let negative = secs.starts_with('-');
            let seconds: i64 = secs
                .parse()
                .map_err(|_| JsonError::InvalidFormat(format!("'{}' is not a valid duration", s)))?;
            let frac_padded = format!("{:0<9}", frac);
            let nanos: i32 = frac_padded[..9]
                .parse()
                .map_err(|_| JsonError::InvalidFormat(format!("'{}' is not a valid duration", s)))?;
            (seconds, if negative { -nanos } else { nanos })
        }
        None => (
            s.parse()
                .map_err(|_| JsonError::InvalidFormat(format!("'{}' is not a valid duration", s)))?,
            0,
        ),
    };
    let mut message = DynamicMessage::new(desc.clone());
    message
        .set(1u32, Value::I64(seconds))
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    message
        .set(2u32, Value::I32(nanos))
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    Ok(message)
}

fn marshal_wrapper(message: &DynamicMessage) -> Result<serde_json::Value, JsonError> {
    let field = message
        .descriptor()
        .get_field(1)
        .expect("wrapper types declare field 1");
    let value = message
        .get(1u32)
        .ok()
        .flatten()
        .map(|v| v.into_owned())
        .unwrap_or_else(|| super::fields::default_value_for_kind(&field.kind()));
    scalar_to_json(&value, &field.kind())
}

fn unmarshal_wrapper(
    desc: &MessageDescriptor,
    json: &serde_json::Value,
) -> Result<DynamicMessage, JsonError> {
    let field = desc.get_field(1).expect("wrapper types declare field 1");
    let mut message = DynamicMessage::new(desc.clone());
    let value = json_to_scalar(json, &field.kind(), false)?;
    message
        .set(1u32, value)
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    Ok(message)
}

fn marshal_any(message: &DynamicMessage) -> Result<serde_json::Value, JsonError> {
    let type_url = message
        .get(1u32)
        .ok()
        .flatten()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let bytes = message
        .get(2u32)
        .ok()
        .flatten()
        .and_then(|v| v.as_bytes().map(<[u8]>::to_vec))
        .unwrap_or_default();

    let type_name = type_url
        .strip_prefix(ANY_TYPE_URL_PREFIX)
        .unwrap_or(&type_url);
    let target = message
        .descriptor()
        .pool()
        .get_message_by_name(type_name)
        .ok_or_else(|| JsonError::UnknownType {
            name: type_name.to_string(),
        })?;

    let inner = super::wire::decode(target, bytes.as_slice())
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    let mut obj = match to_json_value(&inner)? {
        serde_json::Value::Object(obj) => obj,
        other => {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert("value".to_string(), other);
            wrapped
        }
    };
    obj.insert(
        "@type".to_string(),
        serde_json::Value::String(type_url),
    );
    Ok(serde_json::Value::Object(obj))
}

fn unmarshal_any(
    desc: &MessageDescriptor,
    json: &serde_json::Value,
    strict: bool,
) -> Result<DynamicMessage, JsonError> {
    let obj = json
        .as_object()
        .ok_or_else(|| JsonError::InvalidFormat("expected a JSON object for google.protobuf.Any".to_string()))?;
    let type_url = obj
        .get("@type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonError::InvalidFormat("Any value is missing '@type'".to_string()))?
        .to_string();
    let type_name = type_url
        .strip_prefix(ANY_TYPE_URL_PREFIX)
        .unwrap_or(&type_url);
    let target = desc
        .pool()
        .get_message_by_name(type_name)
        .ok_or_else(|| JsonError::UnknownType {
            name: type_name.to_string(),
        })?;

    let mut inner_fields = serde_json::Map::new();
    for (k, v) in obj {
        if k != "@type" {
            inner_fields.insert(k.clone(), v.clone());
        }
    }
    let inner = from_json_value(&target, &serde_json::Value::Object(inner_fields), strict)?;
    let bytes = super::wire::encode(&inner);

    let mut message = DynamicMessage::new(desc.clone());
    message
        .set(1u32, Value::String(type_url))
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    message
        .set(2u32, Value::Bytes(bytes))
        .map_err(|e| JsonError::TypeMismatch { message: e.to_string() })?;
    Ok(message)
}
