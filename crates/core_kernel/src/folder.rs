//! Human-facing folder numbers
//!
//! A booking is known to agents by its folder number. A date-changed
//! follow-on booking keeps the root number and gains a derivative
//! suffix: `123` becomes `123.1`, then `123.2`, and so on. Credit-note
//! lookup walks this ancestry, so a note issued against `123` is
//! offered when paying for `123.2`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FolderNoError {
    #[error("Invalid folder number: {0}")]
    Invalid(String),
}

/// A booking folder number, e.g. `123` or its date-change derivative `123.1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderNo {
    root: u32,
    derivative: Option<u32>,
}

impl FolderNo {
    /// Creates a root folder number
    pub fn new(root: u32) -> Self {
        Self {
            root,
            derivative: None,
        }
    }

    /// Returns the root number shared by all derivatives
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Returns the derivative suffix, if this is a date-change folder
    pub fn derivative(&self) -> Option<u32> {
        self.derivative
    }

    /// Folder number for the next date-change derivative of this folder
    pub fn next_derivative(&self) -> Self {
        Self {
            root: self.root,
            derivative: Some(self.derivative.unwrap_or(0) + 1),
        }
    }

    /// True when both folders trace back to the same original booking
    pub fn same_ancestry(&self, other: &FolderNo) -> bool {
        self.root == other.root
    }
}

impl fmt::Display for FolderNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.derivative {
            Some(n) => write!(f, "{}.{}", self.root, n),
            None => write!(f, "{}", self.root),
        }
    }
}

impl FromStr for FolderNo {
    type Err = FolderNoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FolderNoError::Invalid(s.to_string());

        match s.split_once('.') {
            None => {
                let root = s.parse().map_err(|_| invalid())?;
                Ok(Self::new(root))
            }
            Some((root, suffix)) => {
                let root = root.parse().map_err(|_| invalid())?;
                let derivative: u32 = suffix.parse().map_err(|_| invalid())?;
                if derivative == 0 {
                    return Err(invalid());
                }
                Ok(Self {
                    root,
                    derivative: Some(derivative),
                })
            }
        }
    }
}
