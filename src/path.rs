//! A dotted field-path accessor: `name.sub.sub`, `name[n]` for a repeated
//! index, `name['key']`/`name["key"]` for a map lookup. A leading `$` is
//! accepted and ignored.

use crate::descriptor::{FieldDescriptor, Kind};
use crate::dynamic::{DynamicMessage, MapKey, MessageError, Value};

/// A failure to resolve or apply a field path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// A path component named a field absent from the descriptor in scope at
    /// that point.
    FieldNotFound { name: String },
    /// A repeated-field index `set(name[n], v)` with `n` more than one past
    /// the field's current length.
    IndexOutOfBounds { index: usize, len: usize },
    /// The path string itself could not be parsed.
    Syntax(String),
    /// A step succeeded in resolving a field but failed to apply the
    /// operation to it (wrong shape, wrong value type).
    Message(MessageError),
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::FieldNotFound { name } => write!(f, "no field named '{}'", name),
            PathError::IndexOutOfBounds { index, len } => {
                write!(f, "index {} is out of bounds for a repeated field of length {}", index, len)
            }
            PathError::Syntax(message) => write!(f, "{}", message),
            PathError::Message(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PathError {}

impl From<MessageError> for PathError {
    fn from(err: MessageError) -> Self {
        PathError::Message(err)
    }
}

#[derive(Debug, Clone)]
enum IndexSpec {
    Repeated(usize),
    MapKey(String),
}

#[derive(Debug, Clone)]
struct Step<'a> {
    name: &'a str,
    index: Option<IndexSpec>,
}

fn parse_path(path: &str) -> Result<Vec<Step<'_>>, PathError> {
    let path = path.strip_prefix('$').unwrap_or(path);
    if path.is_empty() {
        return Err(PathError::Syntax("path is empty".to_string()));
    }

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            '.' if depth == 0 => {
                parts.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&path[start..]);

    parts.iter().map(|part| parse_component(part)).collect()
}

fn parse_component(part: &str) -> Result<Step<'_>, PathError> {
    let Some(bracket) = part.find('[') else {
        if part.is_empty() {
            return Err(PathError::Syntax("empty path component".to_string()));
        }
        return Ok(Step { name: part, index: None });
    };
    if !part.ends_with(']') {
        return Err(PathError::Syntax(format!("unterminated index in '{}'", part)));
    }
    let name = &part[..bracket];
    let inner = &part[bracket + 1..part.len() - 1];
    let index = match strip_quotes(inner) {
        Some(key) => IndexSpec::MapKey(key.to_string()),
        None => IndexSpec::Repeated(
            inner
                .parse()
                .map_err(|_| PathError::Syntax(format!("'{}' is not a valid index", inner)))?,
        ),
    };
    Ok(Step {
        name,
        index: Some(index),
    })
}

fn strip_quotes(s: &str) -> Option<&str> {
    if s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')))
    {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn map_key_from_str(raw: &str, field: &FieldDescriptor) -> Result<MapKey, PathError> {
    let entry = field
        .kind()
        .as_message()
        .cloned()
        .ok_or_else(|| PathError::Syntax(format!("field '{}' is not a map", field.name())))?;
    let key_field = entry
        .map_entry_key_field()
        .ok_or_else(|| PathError::Syntax(format!("field '{}' is not a map", field.name())))?;
    let invalid = || PathError::Syntax(format!("'{}' is not a valid map key", raw));
    Ok(match key_field.kind() {
        Kind::String => MapKey::String(raw.to_string()),
        Kind::Bool => MapKey::Bool(raw.parse().map_err(|_| invalid())?),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => MapKey::I32(raw.parse().map_err(|_| invalid())?),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => MapKey::I64(raw.parse().map_err(|_| invalid())?),
        Kind::Uint32 | Kind::Fixed32 => MapKey::U32(raw.parse().map_err(|_| invalid())?),
        Kind::Uint64 | Kind::Fixed64 => MapKey::U64(raw.parse().map_err(|_| invalid())?),
        _ => return Err(invalid()),
    })
}

/// Reads the value addressed by `path`, or `None` if any step along the way
/// is simply unset.
pub fn get(message: &DynamicMessage, path: &str) -> Result<Option<Value>, PathError> {
    let steps = parse_path(path)?;
    get_steps(message, &steps)
}

fn get_steps(message: &DynamicMessage, steps: &[Step<'_>]) -> Result<Option<Value>, PathError> {
    let (first, rest) = steps.split_first().expect("path always has at least one step");
    let field = message
        .descriptor()
        .get_field_by_name(first.name)
        .ok_or_else(|| PathError::FieldNotFound {
            name: first.name.to_string(),
        })?;

    let value = match &first.index {
        None => message.get(field.number())?.map(|v| v.into_owned()),
        Some(IndexSpec::Repeated(n)) => message
            .get(field.number())?
            .and_then(|v| v.as_list().and_then(|items| items.get(*n).cloned())),
        Some(IndexSpec::MapKey(k)) => {
            let key = map_key_from_str(k, &field)?;
            message
                .get(field.number())?
                .and_then(|v| v.as_map().and_then(|m| m.get(&key).cloned()))
        }
    };

    if rest.is_empty() {
        return Ok(value);
    }
    match value {
        Some(Value::Message(inner)) => get_steps(&inner, rest),
        Some(_) => Err(PathError::FieldNotFound {
            name: rest[0].name.to_string(),
        }),
        None => Ok(None),
    }
}

/// Whether the value addressed by `path` is currently set.
pub fn has(message: &DynamicMessage, path: &str) -> Result<bool, PathError> {
    Ok(get(message, path)?.is_some())
}

/// Sets the value addressed by `path`, creating intermediate nested messages
/// as empty containers where needed.
pub fn set(message: &mut DynamicMessage, path: &str, value: Value) -> Result<(), PathError> {
    let steps = parse_path(path)?;
    set_steps(message, &steps, value)
}

fn set_steps(message: &mut DynamicMessage, steps: &[Step<'_>], value: Value) -> Result<(), PathError> {
    let (first, rest) = steps.split_first().expect("path always has at least one step");
    let field = message
        .descriptor()
        .get_field_by_name(first.name)
        .ok_or_else(|| PathError::FieldNotFound {
            name: first.name.to_string(),
        })?;

    if rest.is_empty() {
        return apply_leaf(message, &field, &first.index, value);
    }

    let inner_desc = field
        .kind()
        .as_message()
        .cloned()
        .ok_or_else(|| PathError::FieldNotFound {
            name: rest[0].name.to_string(),
        })?;

    let mut inner = match &first.index {
        None => current_message(message, &field, &inner_desc)?,
        Some(IndexSpec::Repeated(n)) => {
            let items = message.get(field.number())?.map(|v| v.into_owned());
            let len = match &items {
                Some(Value::List(l)) => l.len(),
                _ => 0,
            };
            if *n > len {
                return Err(PathError::IndexOutOfBounds { index: *n, len });
            }
            if *n == len {
                DynamicMessage::new(inner_desc.clone())
            } else {
                match items {
                    Some(Value::List(mut l)) => match l.swap_remove(*n) {
                        Value::Message(m) => m,
                        _ => DynamicMessage::new(inner_desc.clone()),
                    },
                    _ => DynamicMessage::new(inner_desc.clone()),
                }
            }
        }
        Some(IndexSpec::MapKey(k)) => {
            let key = map_key_from_str(k, &field)?;
            match message
                .get(field.number())?
                .and_then(|v| v.as_map().and_then(|m| m.get(&key).cloned()))
            {
                Some(Value::Message(m)) => m,
                _ => DynamicMessage::new(inner_desc.clone()),
            }
        }
    };

    set_steps(&mut inner, rest, value)?;

    match &first.index {
        None => message.set(field.number(), Value::Message(inner))?,
        Some(IndexSpec::Repeated(n)) => {
            let len = message
                .get(field.number())?
                .and_then(|v| v.as_list().map(<[Value]>::len))
                .unwrap_or(0);
            if *n == len {
                message.add_repeated(field.number(), Value::Message(inner))?;
            } else {
                let mut items = message
                    .get(field.number())?
                    .map(|v| v.into_owned())
                    .and_then(|v| match v {
                        Value::List(items) => Some(items),
                        _ => None,
                    })
                    .unwrap_or_default();
                items[*n] = Value::Message(inner);
                message.set(field.number(), Value::List(items))?;
            }
        }
        Some(IndexSpec::MapKey(k)) => {
            let key = map_key_from_str(k, &field)?;
            message.set_map_entry(field.number(), key, Value::Message(inner))?;
        }
    }
    Ok(())
}

fn current_message(
    message: &DynamicMessage,
    field: &FieldDescriptor,
    inner_desc: &crate::descriptor::MessageDescriptor,
) -> Result<DynamicMessage, PathError> {
    Ok(match message.get(field.number())?.map(|v| v.into_owned()) {
        Some(Value::Message(m)) => m,
        _ => DynamicMessage::new(inner_desc.clone()),
    })
}

fn apply_leaf(
    message: &mut DynamicMessage,
    field: &FieldDescriptor,
    index: &Option<IndexSpec>,
    value: Value,
) -> Result<(), PathError> {
    match index {
        None => message.set(field.number(), value)?,
        Some(IndexSpec::Repeated(n)) => {
            let len = message
                .get(field.number())?
                .and_then(|v| v.as_list().map(<[Value]>::len))
                .unwrap_or(0);
            if *n == len {
                message.add_repeated(field.number(), value)?;
            } else if *n < len {
                let mut items = message
                    .get(field.number())?
                    .map(|v| v.into_owned())
                    .and_then(|v| match v {
                        Value::List(items) => Some(items),
                        _ => None,
                    })
                    .unwrap_or_default();
                items[*n] = value;
                message.set(field.number(), Value::List(items))?;
            } else {
                return Err(PathError::IndexOutOfBounds { index: *n, len });
            }
        }
        Some(IndexSpec::MapKey(k)) => {
            let key = map_key_from_str(k, field)?;
            message.set_map_entry(field.number(), key, value)?;
        }
    }
    Ok(())
}

/// Clears the value addressed by `path`.
pub fn clear(message: &mut DynamicMessage, path: &str) -> Result<(), PathError> {
    let steps = parse_path(path)?;
    clear_steps(message, &steps)
}

fn clear_steps(message: &mut DynamicMessage, steps: &[Step<'_>]) -> Result<(), PathError> {
    let (first, rest) = steps.split_first().expect("path always has at least one step");
    let field = message
        .descriptor()
        .get_field_by_name(first.name)
        .ok_or_else(|| PathError::FieldNotFound {
            name: first.name.to_string(),
        })?;

    if rest.is_empty() {
        return match &first.index {
            None => Ok(message.clear(field.number())?),
            Some(IndexSpec::MapKey(k)) => {
                let key = map_key_from_str(k, &field)?;
                message.remove_map_entry(field.number(), &key)?;
                Ok(())
            }
            Some(IndexSpec::Repeated(n)) => {
                let mut items = message
                    .get(field.number())?
                    .map(|v| v.into_owned())
                    .and_then(|v| match v {
                        Value::List(items) => Some(items),
                        _ => None,
                    })
                    .unwrap_or_default();
                if *n < items.len() {
                    items.remove(*n);
                    message.set(field.number(), Value::List(items))?;
                }
                Ok(())
            }
        };
    }

    let Some(Value::Message(mut inner)) = (match &first.index {
        None => message.get(field.number())?.map(|v| v.into_owned()),
        Some(IndexSpec::Repeated(n)) => message
            .get(field.number())?
            .and_then(|v| v.as_list().and_then(|items| items.get(*n).cloned())),
        Some(IndexSpec::MapKey(k)) => {
            let key = map_key_from_str(k, &field)?;
            message
                .get(field.number())?
                .and_then(|v| v.as_map().and_then(|m| m.get(&key).cloned()))
        }
    }) else {
        return Ok(());
    };

    clear_steps(&mut inner, rest)?;

    match &first.index {
        None => message.set(field.number(), Value::Message(inner))?,
        Some(IndexSpec::Repeated(n)) => {
            let mut items = message
                .get(field.number())?
                .map(|v| v.into_owned())
                .and_then(|v| match v {
                    Value::List(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default();
            if *n < items.len() {
                items[*n] = Value::Message(inner);
            }
            message.set(field.number(), Value::List(items))?;
        }
        Some(IndexSpec::MapKey(k)) => {
            let key = map_key_from_str(k, &field)?;
            message.set_map_entry(field.number(), key, Value::Message(inner))?;
        }
    }
    Ok(())
}

/// A fluent wrapper over `set`/`clear`/`has`, each chaining call returning
/// the builder so a message can be assembled in one expression.
pub struct Builder {
    message: DynamicMessage,
}

impl Builder {
    pub fn new(message: DynamicMessage) -> Self {
        Builder { message }
    }

    pub fn set(mut self, path: &str, value: Value) -> Result<Self, PathError> {
        set(&mut self.message, path, value)?;
        Ok(self)
    }

    /// Sets a nested message field by assigning each named child field in
    /// turn, constructing the nested message if it isn't already present.
    pub fn set_message(
        mut self,
        path: &str,
        fields: impl IntoIterator<Item = (&'static str, Value)>,
    ) -> Result<Self, PathError> {
        for (name, value) in fields {
            let sub_path = format!("{}.{}", path, name);
            set(&mut self.message, &sub_path, value)?;
        }
        Ok(self)
    }

    /// Overwrites a repeated field with `values` in order.
    pub fn set_list(mut self, path: &str, values: Vec<Value>) -> Result<Self, PathError> {
        set(&mut self.message, path, Value::List(values))?;
        Ok(self)
    }

    pub fn clear(mut self, path: &str) -> Result<Self, PathError> {
        clear(&mut self.message, path)?;
        Ok(self)
    }

    pub fn has(&self, path: &str) -> Result<bool, PathError> {
        has(&self.message, path)
    }

    pub fn build(self) -> DynamicMessage {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dotted_path() {
        let steps = parse_path("a.b.c").unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].name, "a");
        assert!(steps[0].index.is_none());
    }

    #[test]
    fn parses_repeated_index() {
        let steps = parse_path("tags[2]").unwrap();
        assert_eq!(steps.len(), 1);
        assert!(matches!(steps[0].index, Some(IndexSpec::Repeated(2))));
    }

    #[test]
    fn parses_map_key_with_dot_inside() {
        let steps = parse_path("counts['a.b']").unwrap();
        assert_eq!(steps.len(), 1);
        match &steps[0].index {
            Some(IndexSpec::MapKey(k)) => assert_eq!(k, "a.b"),
            other => panic!("unexpected index: {:?}", other),
        }
    }

    #[test]
    fn leading_dollar_is_ignored() {
        let steps = parse_path("$name").unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, "name");
    }
}
