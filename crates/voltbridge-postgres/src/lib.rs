mod client;
mod reading_repository;

pub use client::PostgresClient;
pub use reading_repository::{PostgresReadingRepository, ReadingRow};
