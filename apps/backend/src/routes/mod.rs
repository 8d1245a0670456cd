pub mod exams;
pub mod questions;
