//! Document text extraction

pub mod document_processor;

pub use document_processor::DocumentProcessor;
