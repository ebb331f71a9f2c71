pub mod log;

pub use self::log::DiagnosticLog;
