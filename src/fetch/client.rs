use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared HTTP request. Lets the record source be driven by a
/// configured `reqwest` client or any wrapper around one.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
