pub mod article;
pub mod condition;
pub mod detection;
pub mod errors;
pub mod labels;
pub mod model;
pub mod record;
pub mod upload;
