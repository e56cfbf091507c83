pub mod backup;
pub mod core;
pub mod students;
pub mod subject;
pub mod sync;
