//! 在线连接注册表
//!
//! 每个 WebSocket 连接持有一个独立的广播通道，推送时按用户/角色选择连接。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use handyhub_common::{Role, UserId};
use handyhub_ports::{RealtimeMessage, RealtimePublisher, Recipient};
use tokio::sync::broadcast;
use tracing::debug;

struct Connection {
    user_id: UserId,
    role: Role,
    sender: broadcast::Sender<RealtimeMessage>,
}

impl Connection {
    fn matches(&self, recipient: &Recipient) -> bool {
        match recipient {
            Recipient::User(user_id) => &self.user_id == user_id,
            Recipient::Role(role) => &self.role == role,
            Recipient::Everyone => true,
        }
    }
}

pub struct RealtimeHub {
    capacity: usize,
    next_id: AtomicU64,
    connections: RwLock<HashMap<u64, Connection>>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }

    // 推送路径不能失败，锁中毒时继续使用内部数据
    fn read(&self) -> RwLockReadGuard<'_, HashMap<u64, Connection>> {
        self.connections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<u64, Connection>> {
        self.connections.write().unwrap_or_else(|e| e.into_inner())
    }

    /// 注册新连接，返回的订阅被丢弃时自动注销
    pub fn subscribe(self: &Arc<Self>, user_id: UserId, role: Role) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = broadcast::channel(self.capacity);
        self.write().insert(
            id,
            Connection {
                user_id: user_id.clone(),
                role,
                sender,
            },
        );
        debug!(connection_id = id, user_id = %user_id, %role, "Realtime connection registered");

        Subscription {
            id,
            hub: Arc::clone(self),
            receiver,
        }
    }

    fn unsubscribe(&self, id: u64) {
        if self.write().remove(&id).is_some() {
            debug!(connection_id = id, "Realtime connection removed");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.read().len()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.read().values().any(|c| &c.user_id == user_id)
    }
}

impl RealtimePublisher for RealtimeHub {
    fn publish(&self, recipient: &Recipient, message: RealtimeMessage) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let connections = self.read();
            for (id, connection) in connections.iter().filter(|(_, c)| c.matches(recipient)) {
                match connection.sender.send(message.clone()) {
                    Ok(_) => delivered += 1,
                    Err(_) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut connections = self.write();
            for id in &closed {
                connections.remove(id);
            }
            debug!(pruned = closed.len(), "Pruned closed realtime connections");
        }

        debug!(event = %message.event, ?recipient, delivered, "Realtime message published");
        delivered
    }
}

/// 单个连接的接收端
pub struct Subscription {
    id: u64,
    hub: Arc<RealtimeHub>,
    receiver: broadcast::Receiver<RealtimeMessage>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn recv(&mut self) -> Result<RealtimeMessage, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
