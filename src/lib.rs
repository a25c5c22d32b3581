pub mod api;
pub mod cms;
pub mod config;
pub mod content;
pub mod dam;
pub mod observability;
pub mod pipeline;
pub mod render;
pub mod urn;
