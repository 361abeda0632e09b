pub mod normalizer;
pub mod sync;

pub use crate::domain::model::{Contact, Pagination, SyncMode, SyncReport};
pub use crate::domain::ports::{ContactDestination, ContactSource, ContactStore};
pub use crate::utils::error::Result;
