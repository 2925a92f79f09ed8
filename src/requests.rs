mod arguments;
mod descriptor;
mod resolver;

pub use arguments::*;
pub use descriptor::*;
pub use resolver::*;
