pub mod attribution;
pub mod catalog;
pub mod institutions;
pub mod logs;
pub mod report;
