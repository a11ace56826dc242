//! RelayServer actor implementation
//!
//! The central actor owning all mutable state: connected clients, the room
//! registry, the client→room index, and the expiry scheduler. Every inbound
//! event and every timer firing arrives as a `ServerCommand` on one mpsc
//! channel, so all mutation is serialized and per-room message order equals
//! command processing order. No locks needed.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::AppError;
use crate::expiry::ExpiryScheduler;
use crate::message::ServerMessage;
use crate::registry::RoomRegistry;
use crate::types::{ClientId, RoomCode};

/// Reason string sent with the expiry broadcast.
const EXPIRY_REASON: &str = "This room has expired and is now closed.";

/// Commands sent from connection handlers (and expiry timers) to the actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Client disconnected
    Disconnect {
        client_id: ClientId,
    },
    /// Create a room with the given time-to-live
    CreateRoom {
        client_id: ClientId,
        ttl_millis: u64,
        username: String,
    },
    /// Join an existing room
    JoinRoom {
        client_id: ClientId,
        room_code: String,
        username: String,
    },
    /// Relay an encrypted payload to a room
    SendMessage {
        client_id: ClientId,
        room_code: String,
        payload: String,
    },
    /// A room's expiry timer fired (or deletion was requested)
    ExpireRoom {
        room_code: RoomCode,
    },
}

/// The relay dispatcher actor
///
/// Routes inbound events to registry/room operations and fans the results
/// out as addressed broadcasts: unicast to one client, to a whole room, or
/// to a room minus the originating client.
pub struct RelayServer {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    /// Live rooms, keyed by code
    registry: RoomRegistry,
    /// Client to room mapping for fast lookup: ClientId -> RoomCode
    client_rooms: HashMap<ClientId, RoomCode>,
    /// Pending expiry timers
    scheduler: ExpiryScheduler,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl RelayServer {
    /// Create a new RelayServer
    ///
    /// The registry is injected rather than created ambiently so tests can
    /// pre-seed it. `cmd_tx` must be the sender side of `receiver`; expiry
    /// timers use it to deliver their firings into the actor.
    pub fn new(
        registry: RoomRegistry,
        cmd_tx: mpsc::Sender<ServerCommand>,
        receiver: mpsc::Receiver<ServerCommand>,
    ) -> Self {
        Self {
            clients: HashMap::new(),
            registry,
            client_rooms: HashMap::new(),
            scheduler: ExpiryScheduler::new(cmd_tx),
            receiver,
        }
    }

    /// Run the actor event loop
    ///
    /// Continuously receives and processes commands until all senders are
    /// dropped.
    pub async fn run(mut self) {
        info!("RelayServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("RelayServer shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id).await;
            }
            ServerCommand::CreateRoom { client_id, ttl_millis, username } => {
                self.handle_create_room(client_id, ttl_millis, username).await;
            }
            ServerCommand::JoinRoom { client_id, room_code, username } => {
                self.handle_join_room(client_id, room_code, username).await;
            }
            ServerCommand::SendMessage { client_id, room_code, payload } => {
                self.handle_send_message(client_id, room_code, payload).await;
            }
            ServerCommand::ExpireRoom { room_code } => {
                self.handle_expire_room(room_code).await;
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::Sender<ServerMessage>) {
        info!("Client {} connected", client_id);
        self.clients.insert(client_id, Client::new(client_id, sender));
        debug!(
            "Total clients: {}, live rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle client disconnection
    ///
    /// Leaves the client's room (if any) and notifies remaining members.
    /// The room itself lingers until its timer fires, even when emptied.
    async fn handle_disconnect(&mut self, client_id: ClientId) {
        info!("Client {} disconnected", client_id);

        if let Some(room_code) = self.client_rooms.remove(&client_id) {
            let username = self
                .clients
                .get(&client_id)
                .map(|c| c.display_name().to_string())
                .unwrap_or_else(|| "Unknown".to_string());

            if let Some(room) = self.registry.get_mut(&room_code) {
                if room.leave(client_id) {
                    let remaining: Vec<ClientId> = room.members().collect();
                    debug!(
                        "Client {} left room {} ({} remaining)",
                        client_id,
                        room_code,
                        remaining.len()
                    );
                    self.broadcast(&remaining, ServerMessage::UserLeft { username }, None)
                        .await;
                }
            }
        }

        self.clients.remove(&client_id);
    }

    /// Handle room creation
    ///
    /// Allocates a unique code, makes the creator member zero, and starts
    /// the room's one-shot expiry timer.
    async fn handle_create_room(&mut self, client_id: ClientId, ttl_millis: u64, username: String) {
        if !self.clients.contains_key(&client_id) {
            return;
        }
        if self.client_rooms.contains_key(&client_id) {
            self.send_error(client_id, AppError::AlreadyInRoom).await;
            return;
        }
        if ttl_millis == 0 {
            self.send_error(client_id, AppError::InvalidTtl).await;
            return;
        }

        let room_code = match self.registry.create(client_id) {
            Ok(code) => code,
            Err(err) => {
                self.send_error(client_id, err).await;
                return;
            }
        };

        self.scheduler
            .schedule(room_code.clone(), Duration::from_millis(ttl_millis));
        self.client_rooms.insert(client_id, room_code.clone());
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.set_username(username.clone());
        }

        info!(
            "Room {} created by '{}' ({}), expires in {}ms",
            room_code, username, client_id, ttl_millis
        );

        self.unicast(
            client_id,
            ServerMessage::RoomCreated {
                room_code: room_code.to_string(),
            },
        )
        .await;
    }

    /// Handle room joining
    ///
    /// On success the joiner gets a full history replay and the other
    /// members get a join notice. A capacity rejection leaves the room
    /// untouched.
    async fn handle_join_room(&mut self, client_id: ClientId, room_code: String, username: String) {
        if !self.clients.contains_key(&client_id) {
            return;
        }
        if self.client_rooms.contains_key(&client_id) {
            self.send_error(client_id, AppError::AlreadyInRoom).await;
            return;
        }

        let room_code = RoomCode::from_string(room_code);

        // Resolve the borrow of the registry into owned data before any
        // further use of self.
        let outcome = match self.registry.get_mut(&room_code) {
            None => Err(AppError::RoomNotFound(room_code.to_string())),
            Some(room) => match room.join(client_id) {
                Err(err) => Err(err),
                Ok(history) => {
                    let history = history.to_vec();
                    let members: Vec<ClientId> = room.members().collect();
                    Ok((history, members))
                }
            },
        };

        let (history, members) = match outcome {
            Ok(parts) => parts,
            Err(err) => {
                self.send_error(client_id, err).await;
                return;
            }
        };

        self.client_rooms.insert(client_id, room_code.clone());
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.set_username(username.clone());
        }

        info!("'{}' ({}) joined room {}", username, client_id, room_code);

        self.unicast(client_id, ServerMessage::JoinSuccess { history })
            .await;
        self.broadcast(
            &members,
            ServerMessage::UserJoined { username },
            Some(client_id),
        )
        .await;
    }

    /// Handle a chat message
    ///
    /// Appends the opaque payload to room history stamped with the sender's
    /// recorded display name, then broadcasts it to every member including
    /// the sender (clients deduplicate their own echo).
    async fn handle_send_message(&mut self, client_id: ClientId, room_code: String, payload: String) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };
        let sender_name = client.display_name().to_string();

        let room_code = RoomCode::from_string(room_code);

        let outcome = match self.registry.get_mut(&room_code) {
            None => Err(AppError::RoomNotFound(room_code.to_string())),
            Some(room) => {
                let stored = room.record_message(sender_name, payload);
                let members: Vec<ClientId> = room.members().collect();
                Ok((stored, members))
            }
        };

        let (stored, members) = match outcome {
            Ok(parts) => parts,
            Err(err) => {
                self.send_error(client_id, err).await;
                return;
            }
        };

        self.broadcast(
            &members,
            ServerMessage::ReceiveMessage {
                payload: stored.payload,
                sender: stored.sender,
            },
            None,
        )
        .await;
    }

    /// Handle a room's expiry
    ///
    /// Terminal: broadcast the expiry notice, then drop the room from the
    /// registry. The room's expire guard makes a timer firing and a racing
    /// manual delete converge on exactly one broadcast.
    async fn handle_expire_room(&mut self, room_code: RoomCode) {
        self.scheduler.cancel(&room_code);

        let Some(room) = self.registry.get_mut(&room_code) else {
            return;
        };
        if !room.expire() {
            return;
        }
        let members: Vec<ClientId> = room.members().collect();

        info!(
            "Room {} expired after {:?} with {} member(s)",
            room_code,
            room.created_at.elapsed(),
            members.len()
        );

        self.broadcast(
            &members,
            ServerMessage::RoomDeleted {
                reason: EXPIRY_REASON.to_string(),
            },
            None,
        )
        .await;

        self.registry.delete(&room_code);
        for member in members {
            self.client_rooms.remove(&member);
        }
    }

    /// Send a message to a single client
    async fn unicast(&self, client_id: ClientId, msg: ServerMessage) {
        if let Some(client) = self.clients.get(&client_id) {
            let _ = client.send(msg).await;
        }
    }

    /// Report an error to the originating client only
    ///
    /// Errors never broadcast and never abort server state.
    async fn send_error(&self, client_id: ClientId, err: AppError) {
        debug!("Client {}: {}", client_id, err);
        self.unicast(client_id, err.into()).await;
    }

    /// Send a message to a set of members, optionally excluding one
    async fn broadcast(&self, members: &[ClientId], msg: ServerMessage, exclude: Option<ClientId>) {
        for &member in members {
            if Some(member) == exclude {
                continue;
            }
            if let Some(client) = self.clients.get(&member) {
                let _ = client.send(msg.clone()).await;
            }
        }
    }
}
