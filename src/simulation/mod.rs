pub mod runner;
pub mod session;
