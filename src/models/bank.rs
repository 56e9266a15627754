//! Supported statement sources and transaction direction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::subject::SubjectCode;
use crate::error::LedgerError;

/// A bank or card whose statement layout is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    Ufj,
    Jcb,
}

impl Bank {
    pub fn all() -> [Bank; 2] {
        [Bank::Ufj, Bank::Jcb]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bank::Ufj => "ufj",
            Bank::Jcb => "jcb",
        }
    }

    /// The ledger account the statement belongs to
    pub fn own_account(&self) -> SubjectCode {
        match self {
            Bank::Ufj => SubjectCode::new(101),
            Bank::Jcb => SubjectCode::new(201),
        }
    }

    /// Debit/credit pair used when no confident prediction exists
    pub fn default_pair(&self, direction: Direction) -> (SubjectCode, SubjectCode) {
        match (self, direction) {
            (Bank::Ufj, Direction::In) => (SubjectCode::new(101), SubjectCode::new(490)),
            (Bank::Ufj, _) => (SubjectCode::new(598), SubjectCode::new(101)),
            (Bank::Jcb, _) => (SubjectCode::new(598), SubjectCode::new(201)),
        }
    }

    /// Remarks used when no confident prediction exists
    pub fn default_remarks(&self) -> &'static str {
        match self {
            Bank::Ufj => "Auto classified",
            Bank::Jcb => "JCB Auto classified",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Bank {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ufj" => Ok(Bank::Ufj),
            "jcb" => Ok(Bank::Jcb),
            other => Err(LedgerError::bank_not_found(other)),
        }
    }
}

/// Money flow relative to the statement's own account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Unknown => "unknown",
        }
    }

    /// Parse `in`/`out`; anything else is `None`
    pub fn parse_rule(s: &str) -> Option<Self> {
        match s.trim() {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
