pub mod query;

pub use query::{DatabaseFilter, DatabaseQuery, FilterCondition, SortDirection, SortSpec};
