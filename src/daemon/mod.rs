pub mod scheduler;
pub mod shutdown;
