pub mod error;
pub mod photos;
pub mod sessions;
pub mod upload;
pub mod users;

pub use error::*;
pub use photos::*;
pub use sessions::*;
pub use upload::*;
pub use users::*;
