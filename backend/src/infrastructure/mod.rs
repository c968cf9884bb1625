pub mod file_system;
pub mod notion;
pub mod parsers;
pub mod persistence;
pub mod renderers;
pub mod webhooks;
