pub mod campaign;
pub mod format;
pub mod history;
pub mod projection;
