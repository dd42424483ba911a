//! Sequential pipeline from document location to persisted records

pub mod processor;

pub use processor::AgendaProcessor;
