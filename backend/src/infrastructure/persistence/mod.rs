mod json_document_repository;

pub use json_document_repository::JsonDocumentRepository;
