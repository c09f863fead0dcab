pub mod config;
pub mod console;
pub mod kernel;
pub mod outputs;
pub mod roster;
pub mod services;
pub mod turns;

// Re-export specific items if needed for convenient access
pub use config::ArenaConfig;
pub use kernel::reactor::Reactor;
pub use turns::TurnOrchestrator;
