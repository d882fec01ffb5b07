#[allow(dead_code)]
pub mod slide_server;
