pub mod actor;
pub mod pool;
pub mod schema;

pub use actor::SqliteCredentialStore;
pub use schema::SqliteSchemaProvisioner;
