pub mod best_price;
pub mod proxy;
pub mod search;
pub mod util;
