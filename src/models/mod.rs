pub mod forklift;

pub use forklift::Forklift;
