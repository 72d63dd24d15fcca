/// Web UI for resampling audio uploads and editing PDF pages in the browser.
mod pdf_routes;
mod routes;

pub use routes::{app, AppState};
