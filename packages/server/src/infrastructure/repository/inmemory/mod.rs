//! InMemory Repository 実装

pub mod party;

pub use party::InMemoryPartyRepository;
