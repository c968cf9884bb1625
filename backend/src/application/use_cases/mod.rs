pub mod content_queries;

pub use content_queries::{GetPostBySlug, GetPostsByCategory, ListCategories, QueryError, QueryResult};
