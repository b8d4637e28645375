mod audit;
mod metadata;
mod report;
mod request;
mod secret;

pub use audit::{AuditEventKind, AuditRecord};
pub use metadata::DumpMetadata;
pub use report::RunReport;
pub use request::{DumpRequest, StoreCredentials};
pub use secret::Secret;
