//! Production service implementations behind the dependency-injection traits

pub mod api_keys;
pub mod gemini;
pub mod report_store;

pub use api_keys::EnvApiKeySource;
pub use gemini::GeminiBackend;
pub use report_store::FsReportStore;
