//! Logout name identifier: the subject `NameID` and its qualifiers packed
//! into one claim value, so a later `LogoutRequest` can echo them exactly.
//!
//! Format: five fields in fixed order (name qualifier, SP name qualifier,
//! format, SP-provided ID, value) joined by `,`. Inside a field `/` is written
//! as `//` and `,` as `/,`, which keeps the join reversible.

use crate::assertion::NameId;
use thiserror::Error;

const DELIMITER: char = ',';
const ESCAPE: char = '/';
const FIELD_COUNT: usize = 5;

/// Errors parsing a logout name identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogoutNameIdentifierError {
    #[error("Expected {FIELD_COUNT} fields in logout name identifier, found {0}")]
    WrongFieldCount(usize),

    #[error("Dangling escape character at end of logout name identifier")]
    DanglingEscape,
}

/// The five parts of a logout name identifier. Absent qualifiers are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutNameIdentifier {
    pub name_qualifier: String,
    pub sp_name_qualifier: String,
    pub format: String,
    pub sp_provided_id: String,
    pub value: String,
}

impl LogoutNameIdentifier {
    #[must_use]
    pub fn from_name_id(name_id: &NameId) -> Self {
        Self {
            name_qualifier: name_id.name_qualifier.clone().unwrap_or_default(),
            sp_name_qualifier: name_id.sp_name_qualifier.clone().unwrap_or_default(),
            format: name_id.format.clone().unwrap_or_default(),
            sp_provided_id: name_id.sp_provided_id.clone().unwrap_or_default(),
            value: name_id.value.clone(),
        }
    }

    /// Convert back to a `NameID`, treating empty qualifiers as absent.
    #[must_use]
    pub fn to_name_id(&self) -> NameId {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        NameId {
            value: self.value.clone(),
            name_qualifier: non_empty(&self.name_qualifier),
            sp_name_qualifier: non_empty(&self.sp_name_qualifier),
            format: non_empty(&self.format),
            sp_provided_id: non_empty(&self.sp_provided_id),
        }
    }

    /// Join the five fields into a single claim value.
    #[must_use]
    pub fn encode(&self) -> String {
        let fields = [
            &self.name_qualifier,
            &self.sp_name_qualifier,
            &self.format,
            &self.sp_provided_id,
            &self.value,
        ];

        let mut out = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            for ch in field.chars() {
                if ch == DELIMITER || ch == ESCAPE {
                    out.push(ESCAPE);
                }
                out.push(ch);
            }
        }
        out
    }

    /// Split a claim value produced by [`encode`](Self::encode).
    pub fn parse(encoded: &str) -> Result<Self, LogoutNameIdentifierError> {
        let mut fields = Vec::with_capacity(FIELD_COUNT);
        let mut current = String::new();
        let mut chars = encoded.chars();

        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(LogoutNameIdentifierError::DanglingEscape),
                },
                DELIMITER => fields.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        fields.push(current);

        if fields.len() != FIELD_COUNT {
            return Err(LogoutNameIdentifierError::WrongFieldCount(fields.len()));
        }

        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        Ok(Self {
            name_qualifier: next(),
            sp_name_qualifier: next(),
            format: next(),
            sp_provided_id: next(),
            value: next(),
        })
    }
}
