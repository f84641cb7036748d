pub mod feature;
pub mod pest;
pub mod request;
pub mod result;
pub mod errors;

pub use feature::*;
pub use pest::*;
pub use request::*;
pub use result::*;
pub use errors::*;
