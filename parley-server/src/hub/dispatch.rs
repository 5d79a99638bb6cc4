use parley_core::MessageKind;
use std::collections::HashMap;

/// Whether a relayed frame is echoed back to the connection that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    IncludeSender,
    ExcludeSender,
}

impl Delivery {
    pub fn excludes_sender(self) -> bool {
        matches!(self, Self::ExcludeSender)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Registry join, then an optional `member-joined` notice to the room.
    Join { notify: Option<Delivery> },
    Leave,
    /// Handed to the call router; never broadcast.
    Call,
    /// Forwarded to the room named in the frame.
    Relay(Delivery),
    Drop,
}

/// Inbound kind → forwarding rule.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    routes: HashMap<MessageKind, Route>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        use Delivery::*;

        let routes = HashMap::from([
            (
                MessageKind::JoinRoom,
                Route::Join {
                    notify: Some(IncludeSender),
                },
            ),
            (MessageKind::LeaveRoom, Route::Leave),
            (MessageKind::ChatMessage, Route::Relay(IncludeSender)),
            (MessageKind::CallRequest, Route::Call),
            (MessageKind::SessionDescription, Route::Relay(ExcludeSender)),
            (MessageKind::ConnectivityCandidate, Route::Relay(ExcludeSender)),
            (MessageKind::CloseNotice, Route::Relay(ExcludeSender)),
            (MessageKind::FileMetadata, Route::Relay(ExcludeSender)),
            (MessageKind::LogLine, Route::Relay(IncludeSender)),
        ]);
        Self { routes }
    }
}

impl DispatchTable {
    pub fn route(&self, kind: MessageKind) -> Route {
        if kind.is_server_only() {
            return Route::Drop;
        }
        self.routes.get(&kind).copied().unwrap_or(Route::Drop)
    }

    /// Changes who sees the `member-joined` notice; `None` silences it.
    pub fn with_join_notice(mut self, notify: Option<Delivery>) -> Self {
        self.routes
            .insert(MessageKind::JoinRoom, Route::Join { notify });
        self
    }

    /// Changes the echo policy of a relayed kind. Kinds that are not relayed are left alone.
    pub fn with_relay(mut self, kind: MessageKind, delivery: Delivery) -> Self {
        if let Some(route @ Route::Relay(_)) = self.routes.get_mut(&kind) {
            *route = Route::Relay(delivery);
        }
        self
    }
}
