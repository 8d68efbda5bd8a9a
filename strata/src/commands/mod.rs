/// Config command handlers
pub mod config;

/// Image command handlers and logic
pub mod image;

/// Repository command handlers and logic
pub mod repo;

/// Version command handlers
pub mod version;
