pub mod types;
pub mod validator;
pub mod model;
pub mod loader;
pub mod resolver;

pub use types::*;
pub use validator::*;
pub use model::*;
pub use loader::*;
