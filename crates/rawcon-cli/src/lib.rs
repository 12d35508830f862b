pub mod buffer;
pub mod campaign;
pub mod config;
pub mod console;
pub mod history;
pub mod logging;
pub mod paths;
pub mod remote;
pub mod store;
