pub mod common;
pub mod photo;
pub mod session;
pub mod upload;
pub mod user;

pub use common::*;
pub use photo::*;
pub use session::*;
pub use upload::*;
pub use user::*;
