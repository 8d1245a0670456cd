pub mod generator;
pub mod grading;
pub mod review;
pub mod session;
