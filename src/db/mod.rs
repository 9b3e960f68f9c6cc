pub mod catalog;
pub mod connection;
pub mod schema;

pub use catalog::SqliteCatalog;
pub use connection::*;
