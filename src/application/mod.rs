pub mod annotator;
pub mod dto;
pub mod filter;
pub mod font;
pub mod ports;
pub mod publisher;
pub mod services;
