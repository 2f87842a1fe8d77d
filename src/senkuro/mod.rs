//! Senkuro, the GraphQL manga upstream.

pub mod normalize;
pub mod queries;
pub mod service;
pub mod upstream;

pub use service::SenkuroService;
