mod database;
mod rate_limit_sweeper;
mod state_builder;

pub use database::connect_and_migrate;
pub use rate_limit_sweeper::spawn_rate_limit_sweeper;
pub use state_builder::build_app_state;

#[cfg(test)]
pub use state_builder::build_in_memory_state;
