//! HTTP API handlers for spotmix-render

pub mod buildinfo;
pub mod health;
pub mod render;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use render::render_spot;
