/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: embedded schema migrations
///
/// Models live in [`crate::models`]; services reach them through
/// [`crate::store`].

pub mod migrations;
pub mod pool;
