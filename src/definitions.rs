mod callable;
mod definition;
mod overrides;
mod value;

pub use callable::*;
pub use definition::*;
pub use overrides::*;
pub use value::*;
