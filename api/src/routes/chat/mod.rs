pub mod chat_events;
pub mod chat_route;
pub mod ws_sink;
