//! Upload metadata checks layered over channel validation.

use serde::Deserialize;

use crate::command::domain::{CommandRequest, ValidatedInput};
use crate::command::ports::Validator;
use crate::outcome::{Failure, Outcome};

use super::channels::{ChannelSchemas, validate};

/// Constraints on an uploaded file.
///
/// An empty MIME allow-list accepts every type; a missing size ceiling
/// accepts every size.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// Reject requests without a file.
    pub required: bool,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
    /// Maximum accepted size in bytes.
    pub max_size_bytes: Option<u64>,
}

impl FileOptions {
    /// Options requiring a file.
    #[must_use]
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// Restricts the accepted MIME types.
    #[must_use]
    pub fn allow_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.allowed_mime_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the size ceiling.
    #[must_use]
    pub const fn max_size(mut self, bytes: u64) -> Self {
        self.max_size_bytes = Some(bytes);
        self
    }
}

/// Validates the channels, then the uploaded file's presence, type and
/// size.
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    schemas: ChannelSchemas,
    options: FileOptions,
}

impl FileValidator {
    /// Creates a validator from channel schemas and file constraints.
    #[must_use]
    pub const fn new(schemas: ChannelSchemas, options: FileOptions) -> Self {
        Self { schemas, options }
    }
}

impl Validator for FileValidator {
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        let input = validate(request, &self.schemas)?;
        let Some(file) = request.file() else {
            if self.options.required {
                return Err(Failure::validation("file is required"));
            }
            return Ok(input);
        };

        let allowed = &self.options.allowed_mime_types;
        if !allowed.is_empty() && !allowed.iter().any(|mime| mime == file.mime_type()) {
            return Err(Failure::validation(format!(
                "file type '{}' is not allowed; accepted types: {}",
                file.mime_type(),
                allowed.join(", ")
            )));
        }
        if let Some(limit) = self
            .options
            .max_size_bytes
            .filter(|limit| file.size_bytes() > *limit)
        {
            return Err(Failure::validation(format!(
                "file size {} bytes exceeds the limit of {limit} bytes",
                file.size_bytes()
            )));
        }
        Ok(input)
    }
}
