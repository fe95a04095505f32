pub mod api;
pub mod cli;
pub mod core;
pub mod google;
pub mod responder;
pub mod store;
pub mod workflow;
