//! Repository modules for database operations

pub mod apps;

pub use apps::AppsRepo;
