use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// The record types the DNS-provider enumeration loop understands. Anything
/// else is a structural error and gets skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    CName,
    Ns,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::CName => "CNAME",
            RecordType::Ns => "NS",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "CNAME" => Ok(RecordType::CName),
            "NS" => Ok(RecordType::Ns),
            other => Err(DomainError::UnsupportedRecordType(other.to_string())),
        }
    }
}
