//! Date-bearing property sets
//!
//! Dates travel twice into the graph: as their literal RFC 3339 string and
//! as a derived Unix-epoch integer, so range queries never re-parse
//! strings. Building the set up front means a bad date fails the whole
//! operation before any statement is submitted.

use chrono::DateTime;

use crate::error::{Result, ServiceError};

/// Inception/termination properties for a membership node or role edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateProps {
    pub inception_date: Option<String>,
    pub inception_epoch: Option<i64>,
    pub termination_date: Option<String>,
    pub termination_epoch: Option<i64>,
}

impl DateProps {
    /// Build the property set from optional date strings, deriving epochs.
    pub fn build(inception: Option<&str>, termination: Option<&str>) -> Result<Self> {
        let mut props = DateProps::default();
        if let Some(value) = inception {
            props.inception_epoch = Some(epoch_seconds("inceptionDate", value)?);
            props.inception_date = Some(value.to_owned());
        }
        if let Some(value) = termination {
            props.termination_epoch = Some(epoch_seconds("terminationDate", value)?);
            props.termination_date = Some(value.to_owned());
        }
        Ok(props)
    }
}

fn epoch_seconds(field: &'static str, value: &str) -> Result<i64> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|source| ServiceError::invalid_date(field, value, source))?;
    Ok(parsed.timestamp())
}
