pub mod chat;
pub mod fallback_route;
pub mod health;
