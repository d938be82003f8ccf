mod handler;

pub use handler::get_api_metrics;
