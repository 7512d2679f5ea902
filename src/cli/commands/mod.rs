pub mod check;
pub mod config;
pub mod document;
pub mod publish;
pub mod scorecard;
pub mod validate;
