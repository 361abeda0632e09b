// Adapters layer: concrete implementations of the domain ports (http services, sqlite).

pub mod newsletter;
pub mod notion;
pub mod sqlite_store;

pub use newsletter::NewsletterClient;
pub use notion::NotionSource;
pub use sqlite_store::SqliteContactStore;
