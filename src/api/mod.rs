pub mod context;
pub mod handlers;
pub mod routes;
pub mod upload_handlers;

pub use context::*;
pub use handlers::*;
pub use routes::*;
pub use upload_handlers::*;
