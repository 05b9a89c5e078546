mod init_tracing;

pub use init_tracing::{TracingConfig, init_tracing};
