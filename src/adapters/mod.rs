// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod model;
pub mod storage;

pub use http::HttpFetcher;
pub use model::LinearModel;
pub use storage::LocalStorage;
