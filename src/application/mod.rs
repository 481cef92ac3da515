pub mod catalog;
pub mod repos;
