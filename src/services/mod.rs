/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Table lifecycle operations exposed over HTTP.
pub mod table_service;
