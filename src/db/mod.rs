pub mod connection;
pub mod projects;
pub mod reports;
pub mod schema;

pub use connection::Database;
