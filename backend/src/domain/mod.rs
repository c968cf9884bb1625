// Domain layer module
pub mod aggregates;
pub mod base;
pub mod entities;
pub mod sync_state;
pub mod value_objects;

pub use aggregates::*;
pub use base::*;
pub use entities::*;
pub use sync_state::*;
pub use value_objects::*;
