mod connection_pool;
pub mod chart_record;
pub mod schema;
