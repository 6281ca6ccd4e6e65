pub mod handlers;
pub mod openapi;
pub mod responses;
pub mod routes;

pub use handlers::*;
pub use openapi::*;
pub use responses::*;
pub use routes::create_router;
