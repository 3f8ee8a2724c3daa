//! HTTP server layer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │               GET /{tile_prefix}/{z}/{x}/{y}                    │
//! │                                                                 │
//! │        ┌──────────────────┐      ┌──────────────────────┐       │
//! │        │     handlers     │      │        routes        │       │
//! │        │ (path → Reader)  │      │ (prefix, CORS, trace)│       │
//! │        └──────────────────┘      └──────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    content_type_for_format, health_handler, parse_tile_path, tile_handler, AppState,
    HealthResponse,
};
pub use routes::{create_router, RouterConfig, DEFAULT_CACHE_MAX_AGE};
