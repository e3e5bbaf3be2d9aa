pub mod notification_queries;
pub mod order_queries;
pub mod product_queries;
