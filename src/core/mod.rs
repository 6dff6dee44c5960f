pub mod candidate;
pub mod config;
pub mod error;
pub mod path;
pub mod reference;
pub mod result;
pub mod shape;
pub mod similarity;
