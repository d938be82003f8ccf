// 实时通道
// 目前只承载 ping/pong 心跳，broadcast 留作事件推送入口

pub mod directory;
pub mod handler;

pub use directory::{ConnectionDirectory, ConnectionHandle};
pub use handler::websocket;
