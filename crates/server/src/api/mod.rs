pub mod dispatcher;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
