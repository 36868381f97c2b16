//! orgsync core library.
//!
//! Reads the WeCom organization directory (departments and their members)
//! and reshapes it into flat records for import into a directory service
//! such as LDAP: romanized names, generated usernames, validated or
//! substituted email addresses, and namespaced department IDs.

pub mod assembler;
pub mod config;
pub mod derive;
pub mod errors;
pub mod models;
pub mod transliterate;
pub mod wecom;

// Re-exports for convenience.
pub use assembler::{AssemblySettings, RecordAssembler};
pub use config::AppConfig;
pub use models::{DepartmentRecord, UserRecord};
pub use wecom::{DirectoryClient, WeComClient};
