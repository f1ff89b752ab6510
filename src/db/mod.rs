pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryMessageStore;
pub use postgres::PgMessageStore;
pub use store::{MessageStore, StoreError};
