//! Page metadata and write acknowledgements.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Document;
use crate::outcome::{Failure, Outcome};

/// Metadata describing one page of a listing.
///
/// Always derived from the total count; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// One-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Documents matching the filter across all pages.
    pub total_count: u64,
    /// Number of pages needed to cover `total_count`.
    pub total_pages: u64,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_prev_page: bool,
}

impl PageInfo {
    /// Computes page metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// use conservatory::repository::domain::PageInfo;
    ///
    /// let info = PageInfo::compute(2, 10, 15);
    /// assert_eq!(info.total_pages, 2);
    /// assert!(!info.has_next_page);
    /// assert!(info.has_prev_page);
    /// ```
    #[must_use]
    pub const fn compute(page: u64, limit: u64, total_count: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_count.div_ceil(limit)
        };
        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// One page of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult {
    /// Documents on this page.
    pub documents: Vec<Document>,
    /// Page metadata.
    pub pagination: PageInfo,
}

impl PaginatedResult {
    /// Decodes the documents into typed entities.
    ///
    /// # Errors
    ///
    /// Returns a validation failure naming the first document that does not
    /// match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Outcome<Vec<T>> {
        self.documents.iter().cloned().map(decode_document).collect()
    }

    /// Serialises the page for a response payload.
    ///
    /// # Errors
    ///
    /// Returns an internal failure if serialisation fails.
    pub fn to_value(&self) -> Outcome<Value> {
        serde_json::to_value(self)
            .map_err(|error| Failure::internal(format!("page is not serialisable: {error}")))
    }
}

/// Decodes a single document into a typed entity.
///
/// # Errors
///
/// Returns a validation failure when the document does not match `T`.
pub fn decode_document<T: DeserializeOwned>(document: Document) -> Outcome<T> {
    serde_json::from_value(Value::Object(document))
        .map_err(|error| Failure::validation(format!("document does not match entity: {error}")))
}

/// Result of a multi-document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    /// Documents matching the filter.
    pub matched_count: u64,
    /// Documents whose content changed.
    pub modified_count: u64,
}

/// Result of a multi-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    /// Documents removed.
    pub deleted_count: u64,
}
