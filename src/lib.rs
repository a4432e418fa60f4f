//! Client-side data pipeline for the breast-cancer classification teaching
//! dashboard: typed access to the prediction backend, chart-ready view
//! builders, per-page controllers and text/HTML presentation.

pub mod api;
pub mod config;
pub mod controller;
pub mod logging;
pub mod model;
pub mod render;
pub mod views;
