//! Separator based identifier codec.

use tracing::trace;

use crate::error::IdentifierError;

/// Separator used by resources that do not pick their own.
pub const DEFAULT_SEPARATOR: char = ',';

/// Encodes and decodes multi-field identifiers with a fixed separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierCodec {
    separator: char,
}

impl Default for IdentifierCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl IdentifierCodec {
    /// Creates a codec using `separator`.
    #[must_use]
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Returns the separator.
    #[must_use]
    pub const fn separator(&self) -> char {
        self.separator
    }

    /// Joins `fields` into a single identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no fields are given, or if any field is empty or
    /// contains the separator.
    pub fn encode<S: AsRef<str>>(&self, fields: &[S]) -> Result<String, IdentifierError> {
        if fields.is_empty() {
            return Err(IdentifierError::NoFields);
        }

        for (index, field) in fields.iter().enumerate() {
            let field = field.as_ref();
            if field.is_empty() {
                return Err(IdentifierError::EmptyField { index });
            }
            if field.contains(self.separator) {
                return Err(IdentifierError::InvalidField {
                    index,
                    field: field.to_string(),
                    separator: self.separator,
                });
            }
        }

        let mut buf = [0u8; 4];
        let separator: &str = self.separator.encode_utf8(&mut buf);
        let id = fields
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(separator);

        trace!("Encoded identifier: {id}");
        Ok(id)
    }

    /// Splits `id` into exactly `expected_fields` non-empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] if the segment count differs
    /// from `expected_fields` or any segment is empty.
    pub fn decode(&self, id: &str, expected_fields: usize) -> Result<Vec<String>, IdentifierError> {
        let parts: Vec<&str> = id.split(self.separator).collect();

        if parts.len() != expected_fields || parts.iter().any(|p| p.is_empty()) {
            return Err(IdentifierError::Malformed {
                id: id.to_string(),
                expected: expected_fields,
                found: parts.len(),
                separator: self.separator,
            });
        }

        Ok(parts.into_iter().map(String::from).collect())
    }

    /// Decodes `id` into a fixed-size array of fields.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] under the same conditions as
    /// [`IdentifierCodec::decode`].
    pub fn decode_fixed<const N: usize>(&self, id: &str) -> Result<[String; N], IdentifierError> {
        let fields = self.decode(id, N)?;
        let found = fields.len();
        fields.try_into().map_err(|_| IdentifierError::Malformed {
            id: id.to_string(),
            expected: N,
            found,
            separator: self.separator,
        })
    }
}
