pub mod ab_join;
pub mod common;
pub mod fluss;
pub mod row;
pub mod stomp;
