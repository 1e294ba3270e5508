//! Element identities shared by the diagram model and the layout result.
//!
//! This module provides the [`Id`] type. Identifiers are reference-counted
//! strings: cloning is cheap, equality compares content, and no process-wide
//! table is involved, so independent layout invocations never share state.

use std::{borrow::Borrow, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Identity of a participant, node, or cluster.
///
/// # Examples
///
/// ```
/// use astrolabe_core::identifier::Id;
///
/// let client = Id::new("client");
/// let same = Id::from("client");
///
/// assert_eq!(client, same);
/// assert_eq!(client, "client");
///
/// let nested = Id::new("billing").create_nested(&Id::new("db"));
/// assert_eq!(nested, "billing::db");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(Arc<str>);

impl Id {
    /// Creates an `Id` from &str.
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Creates an identifier for an element that has no name in the source.
    ///
    /// # Arguments
    ///
    /// * `idx` - A unique index used to generate the anonymous identifier.
    pub fn from_anonymous(idx: usize) -> Self {
        Self::new(&format!("__{idx}"))
    }

    /// Creates a nested ID by combining this ID and a child ID with a '::' separator.
    pub fn create_nested(&self, child_id: &Id) -> Self {
        Self::new(&format!("{}::{}", self.0, child_id.0))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Id {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
