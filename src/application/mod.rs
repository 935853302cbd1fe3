/// Application layer - Use cases and DTOs
///
/// This layer orchestrates the enrichment domain and talks to
/// infrastructure only through the outbound ports.
pub mod dto;
pub mod use_cases;
