//! Ranking provider implementations

pub mod http;

pub use http::HttpRankingProvider;
