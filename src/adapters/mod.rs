// Adapters layer: concrete implementations of the domain ports (smtp, files, timers).

pub mod pacer;
pub mod smtp;
pub mod source;
pub mod storage;

pub use pacer::TokioPacer;
pub use smtp::{DisabledMailer, SmtpMailer};
pub use storage::LocalCertificateStore;
