use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// 每个连接待写出的消息上限，写不完的推送直接丢弃
pub const OUTBOX_CAPACITY: usize = 32;

/// 一个已登记的连接
///
/// 持有发往该连接写任务的通道，token 用于区分同一 client_id 的新旧连接。
#[derive(Debug)]
pub struct ConnectionHandle {
    pub client_id: String,
    token: Uuid,
    sender: mpsc::Sender<Message>,
}

impl ConnectionHandle {
    /// 写任务已结束或待写队列已满时返回 false
    pub fn send(&self, message: Message) -> bool {
        self.sender.try_send(message).is_ok()
    }
}

struct Entry {
    token: Uuid,
    sender: mpsc::Sender<Message>,
}

/// 活跃连接表，同一 client_id 后连接者覆盖先连接者
#[derive(Clone, Default)]
pub struct ConnectionDirectory {
    connections: Arc<RwLock<HashMap<String, Entry>>>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(
        &self,
        client_id: &str,
    ) -> (ConnectionHandle, mpsc::Receiver<Message>) {
        let (sender, receiver) = mpsc::channel(OUTBOX_CAPACITY);
        let token = Uuid::new_v4();

        let replaced = self.connections.write().await.insert(
            client_id.to_string(),
            Entry {
                token,
                sender: sender.clone(),
            },
        );
        if replaced.is_some() {
            tracing::info!("WebSocket client {} reconnected, replacing old entry", client_id);
        }

        let handle = ConnectionHandle {
            client_id: client_id.to_string(),
            token,
            sender,
        };
        (handle, receiver)
    }

    /// 只移除仍属于该连接的条目，被覆盖的旧连接关闭时不影响新连接
    pub async fn remove(&self, handle: &ConnectionHandle) -> bool {
        let mut connections = self.connections.write().await;
        let owned = connections
            .get(&handle.client_id)
            .is_some_and(|entry| entry.token == handle.token);
        if owned {
            connections.remove(&handle.client_id);
        }
        owned
    }

    /// 以 JSON 文本推送给所有连接，返回成功投递的数量
    pub async fn broadcast<T: Serialize>(&self, message: &T) -> Result<usize, serde_json::Error> {
        let text = serde_json::to_string(message)?;
        let connections = self.connections.read().await;

        let mut delivered = 0;
        for (client_id, entry) in connections.iter() {
            match entry.sender.try_send(Message::Text(text.clone().into())) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Dropping broadcast to {}: outbox full", client_id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::error!("Error broadcasting message to {}: connection closed", client_id);
                }
            }
        }
        Ok(delivered)
    }

    pub async fn contains(&self, client_id: &str) -> bool {
        self.connections.read().await.contains_key(client_id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
