use std::fmt;

/// An error produced while validating a set of descriptors before they are
/// admitted into a [`DescriptorPool`][crate::DescriptorPool].
#[derive(Debug)]
pub struct DescriptorError {
    kind: DescriptorErrorKind,
}

#[derive(Debug)]
enum DescriptorErrorKind {
    UnknownSyntax { syntax: String },
    InvalidMapEntry { name: String },
    EmptyEnum { name: String },
    MissingEnumZeroValue { name: String },
    InvalidOneofIndex { message: String, field: String },
    InvalidFieldNumber { message: String, field: String, number: i32 },
    ReservedFieldNumber { message: String, field: String, number: i32 },
    DuplicateFieldNumber { message: String, number: i32 },
    DuplicateFieldName { message: String, name: String },
    MissingFieldType { message: String, field: String },
}

impl DescriptorError {
    pub(super) fn unknown_syntax(syntax: impl ToString) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::UnknownSyntax {
                syntax: syntax.to_string(),
            },
        }
    }

    pub(super) fn invalid_map_entry(name: impl ToString) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::InvalidMapEntry {
                name: name.to_string(),
            },
        }
    }

    pub(super) fn empty_enum(name: impl ToString) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::EmptyEnum {
                name: name.to_string(),
            },
        }
    }

    pub(super) fn missing_enum_zero_value(name: impl ToString) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::MissingEnumZeroValue {
                name: name.to_string(),
            },
        }
    }

    pub(super) fn invalid_oneof_index(message: impl ToString, field: impl ToString) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::InvalidOneofIndex {
                message: message.to_string(),
                field: field.to_string(),
            },
        }
    }

    pub(super) fn invalid_field_number(
        message: impl ToString,
        field: impl ToString,
        number: i32,
    ) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::InvalidFieldNumber {
                message: message.to_string(),
                field: field.to_string(),
                number,
            },
        }
    }

    pub(super) fn reserved_field_number(
        message: impl ToString,
        field: impl ToString,
        number: i32,
    ) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::ReservedFieldNumber {
                message: message.to_string(),
                field: field.to_string(),
                number,
            },
        }
    }

    pub(super) fn duplicate_field_number(message: impl ToString, number: i32) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::DuplicateFieldNumber {
                message: message.to_string(),
                number,
            },
        }
    }

    pub(super) fn duplicate_field_name(message: impl ToString, name: impl ToString) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::DuplicateFieldName {
                message: message.to_string(),
                name: name.to_string(),
            },
        }
    }

    pub(super) fn missing_field_type(message: impl ToString, field: impl ToString) -> Self {
        DescriptorError {
            kind: DescriptorErrorKind::MissingFieldType {
                message: message.to_string(),
                field: field.to_string(),
            },
        }
    }
}

impl std::error::Error for DescriptorError {}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DescriptorErrorKind::UnknownSyntax { syntax } => {
                write!(f, "the syntax '{}' is not recognized", syntax)
            }
            DescriptorErrorKind::InvalidMapEntry { name } => {
                write!(f, "the map entry message '{}' is invalid", name)
            }
            DescriptorErrorKind::EmptyEnum { name } => {
                write!(f, "enum '{}' must have at least one value", name)
            }
            DescriptorErrorKind::MissingEnumZeroValue { name } => {
                write!(
                    f,
                    "proto3 enum '{}' must declare a value numbered zero",
                    name
                )
            }
            DescriptorErrorKind::InvalidOneofIndex { message, field } => {
                write!(
                    f,
                    "the oneof index for field '{}' of message '{}' is invalid",
                    field, message
                )
            }
            DescriptorErrorKind::InvalidFieldNumber {
                message,
                field,
                number,
            } => write!(
                f,
                "field '{}' of message '{}' has an invalid number {}",
                field, message, number
            ),
            DescriptorErrorKind::ReservedFieldNumber {
                message,
                field,
                number,
            } => write!(
                f,
                "field '{}' of message '{}' uses reserved number {}",
                field, message, number
            ),
            DescriptorErrorKind::DuplicateFieldNumber { message, number } => write!(
                f,
                "message '{}' has more than one field numbered {}",
                message, number
            ),
            DescriptorErrorKind::DuplicateFieldName { message, name } => write!(
                f,
                "message '{}' has more than one field named '{}'",
                message, name
            ),
            DescriptorErrorKind::MissingFieldType { message, field } => write!(
                f,
                "field '{}' of message '{}' has no declared type",
                field, message
            ),
        }
    }
}

/// An error produced while admitting a file (and its transitive dependencies)
/// into a [`DescriptorPool`][crate::DescriptorPool].
#[derive(Debug)]
pub enum RegistryError {
    /// A file with the same name but different content was already registered.
    DuplicateFile { name: String },
    /// A message, enum or service with this fully-qualified name is already
    /// registered by a different file.
    DuplicateSymbol { name: String },
    /// A field, method or extension referenced a type that could not be
    /// resolved against the files registered so far (including the ones
    /// being registered in the same call).
    SymbolNotFound { name: String },
    /// A dependency named by a file was not present in the batch being
    /// registered and has not been registered previously.
    MissingDependency { file: String, dependency: String },
    /// The descriptors themselves failed structural validation.
    Invalid(DescriptorError),
}

impl From<DescriptorError> for RegistryError {
    fn from(err: DescriptorError) -> Self {
        RegistryError::Invalid(err)
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateFile { name } => write!(
                f,
                "a conflicting file named '{}' is already registered",
                name
            ),
            RegistryError::DuplicateSymbol { name } => write!(
                f,
                "the message, enum or service '{}' is defined multiple times",
                name
            ),
            RegistryError::SymbolNotFound { name } => {
                write!(f, "the type '{}' was not found in the pool", name)
            }
            RegistryError::MissingDependency { file, dependency } => write!(
                f,
                "file '{}' depends on '{}' which has not been registered",
                file, dependency
            ),
            RegistryError::Invalid(err) => write!(f, "{}", err),
        }
    }
}
