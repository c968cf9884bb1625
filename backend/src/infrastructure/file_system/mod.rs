pub mod discovery;

pub use discovery::discover_document_files;
