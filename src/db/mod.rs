pub mod pool;

#[cfg(test)]
pub(crate) mod testing;

pub use pool::{create_pool, run_migrations};
