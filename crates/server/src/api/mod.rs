pub mod handlers;
pub mod middleware;
pub mod mosaic;
pub mod routes;

pub use routes::create_router;
