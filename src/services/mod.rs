pub mod forklift_service;

pub use forklift_service::*;
