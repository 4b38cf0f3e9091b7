//! Documents, query vocabulary, options and page metadata.

mod document;
mod options;
mod page;
mod query;

pub use document::{CREATED_AT_FIELD, Document, DocumentId, ID_FIELD, UPDATED_AT_FIELD};
pub use options::{
    FindOptions, MAX_PAGE_LIMIT, PaginationOptions, ReadOptions, SearchOptions, UpdateOptions,
};
pub use page::{DeleteAck, PageInfo, PaginatedResult, UpdateAck, decode_document};
pub use query::{Filter, Populate, Projection, Sort, SortDirection, Update};
