mod schema;
mod table;

pub use schema::*;
pub use table::*;
