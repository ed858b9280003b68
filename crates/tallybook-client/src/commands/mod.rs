pub mod backup;
pub mod import;
