pub mod controller;
pub mod converter;
pub mod rate_fetcher;
