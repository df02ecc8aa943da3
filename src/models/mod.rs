pub mod dataset;
pub mod query;
pub mod schema;

pub use dataset::*;
pub use query::*;
pub use schema::*;
