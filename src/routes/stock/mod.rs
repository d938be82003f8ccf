mod handler;
mod model;

pub use handler::get_stock_data;
pub use model::StockQuery;
