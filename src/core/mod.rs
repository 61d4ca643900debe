pub mod errors;
pub mod models;
pub mod money;
pub mod services;
pub mod simplify;
pub mod split;
pub mod validation;
