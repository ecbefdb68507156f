//! Read-only contacts directory interface.

use crate::calendar::BoxFuture;
use crate::error::ProviderResult;

/// A contact match, reduced to what a reminder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    /// Display name of the contact, if the directory has one.
    pub display_name: Option<String>,
    /// First listed phone number, unnormalised.
    pub phone_raw: Option<String>,
}

impl ContactRecord {
    /// Creates a contact with a name and phone.
    pub fn new(display_name: impl Into<String>, phone_raw: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            phone_raw: Some(phone_raw.into()),
        }
    }
}

/// Free-text contact search.
pub trait ContactDirectory: Send + Sync {
    /// Searches contacts by name and returns matches in ranked order.
    ///
    /// An empty vector means no match; errors are reserved for the
    /// directory being unreachable or refusing the query.
    fn search<'a>(&'a self, name: &'a str) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>>;
}
