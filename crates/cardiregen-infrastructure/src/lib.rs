pub mod config_service;
pub mod frame_loader;
pub mod paths;

pub use config_service::ConfigService;
pub use frame_loader::load_frame;
pub use paths::CardiregenPaths;
