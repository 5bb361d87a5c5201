use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use futures::StreamExt;
use libp2p::{
    gossipsub, identify, kad, noise,
    swarm::{NetworkBehaviour, SwarmEvent},
    ping, tcp, yamux, Multiaddr, PeerId, Swarm,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use xln_replay::ServerInput;

use crate::config::P2pConfig;
use crate::message::P2pMessage;

/// Combined libp2p network behaviour for an XLN node.
///
/// The `#[derive(NetworkBehaviour)]` macro auto-generates an
/// `XlnBehaviourEvent` enum with one variant per field.
#[derive(NetworkBehaviour)]
pub struct XlnBehaviour {
    pub gossipsub: gossipsub::Behaviour,
    pub kademlia: kad::Behaviour<kad::store::MemoryStore>,
    pub identify: identify::Behaviour,
    pub ping: ping::Behaviour,
}

/// Application-facing handle returned from `P2pNetwork::new()`.
pub struct P2pHandle {
    /// Send here to gossip a message to all connected peers.
    pub outbound_tx: mpsc::Sender<P2pMessage>,
    /// Receive here to consume messages arriving from peers, already
    /// translated into `ServerInput`s where the message implies one.
    pub inbound_rx: mpsc::Receiver<ServerInput>,
    /// Local libp2p peer identity.
    pub local_peer_id: PeerId,
}

/// Owns the libp2p Swarm. Pass to `tokio::spawn(network.run())`.
pub struct P2pNetwork {
    swarm: Swarm<XlnBehaviour>,
    tx_topic: gossipsub::IdentTopic,
    frame_topic: gossipsub::IdentTopic,
    outbound_rx: mpsc::Receiver<P2pMessage>,
    inbound_tx: mpsc::Sender<ServerInput>,
}

impl P2pNetwork {
    /// Build the network and return `(P2pNetwork, P2pHandle)`.
    pub fn new(config: &P2pConfig) -> Result<(Self, P2pHandle), Box<dyn std::error::Error + Send + Sync>> {
        let tx_topic = gossipsub::IdentTopic::new(&config.tx_topic);
        let frame_topic = gossipsub::IdentTopic::new(&config.frame_topic);

        let mut swarm = libp2p::SwarmBuilder::with_new_identity()
            .with_tokio()
            .with_tcp(tcp::Config::default(), noise::Config::new, yamux::Config::default)?
            .with_behaviour(|key: &libp2p::identity::Keypair| {
                let message_id_fn = |msg: &gossipsub::Message| {
                    let mut s = DefaultHasher::new();
                    msg.data.hash(&mut s);
                    gossipsub::MessageId::from(s.finish().to_string())
                };

                let gossipsub_config = gossipsub::ConfigBuilder::default()
                    .heartbeat_interval(Duration::from_secs(1))
                    .validation_mode(gossipsub::ValidationMode::Strict)
                    .message_id_fn(message_id_fn)
                    .build()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

                let gossipsub = gossipsub::Behaviour::new(
                    gossipsub::MessageAuthenticity::Signed(key.clone()),
                    gossipsub_config,
                )
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

                let store = kad::store::MemoryStore::new(key.public().to_peer_id());
                let kademlia = kad::Behaviour::new(key.public().to_peer_id(), store);

                let identify =
                    identify::Behaviour::new(identify::Config::new(config.protocol_version.clone(), key.public()));

                let ping = ping::Behaviour::default();

                Ok(XlnBehaviour { gossipsub, kademlia, identify, ping })
            })?
            .build();

        swarm.behaviour_mut().gossipsub.subscribe(&tx_topic)?;
        swarm.behaviour_mut().gossipsub.subscribe(&frame_topic)?;

        let listen_addr: Multiaddr = config.listen_addr.parse()?;
        swarm.listen_on(listen_addr)?;

        for addr_str in &config.bootstrap_peers {
            if let Ok(addr) = addr_str.parse::<Multiaddr>() {
                if let Some(libp2p::multiaddr::Protocol::P2p(peer_id)) = addr.iter().last() {
                    swarm.behaviour_mut().kademlia.add_address(&peer_id, addr.clone());
                    debug!(peer = %peer_id, "added bootstrap peer");
                }
            }
        }

        let local_peer_id = *swarm.local_peer_id();
        let (outbound_tx, outbound_rx) = mpsc::channel(256);
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        let network = P2pNetwork { swarm, tx_topic, frame_topic, outbound_rx, inbound_tx };
        let handle = P2pHandle { outbound_tx, inbound_rx, local_peer_id };

        Ok((network, handle))
    }

    /// Drive the P2P event loop. Run in a dedicated tokio task.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(msg) = self.outbound_rx.recv() => {
                    let topic = match &msg {
                        P2pMessage::FrameAnnounce { .. } => self.frame_topic.clone(),
                        _ => self.tx_topic.clone(),
                    };
                    let data = msg.to_bytes();
                    if let Err(e) = self.swarm.behaviour_mut().gossipsub.publish(topic, data) {
                        warn!(error = %e, "gossipsub publish failed");
                    }
                }

                event = self.swarm.select_next_some() => {
                    match event {
                        SwarmEvent::NewListenAddr { address, .. } => {
                            info!(addr = %address, "P2P listening on");
                        }
                        SwarmEvent::Behaviour(XlnBehaviourEvent::Gossipsub(
                            gossipsub::Event::Message { message, .. },
                        )) => {
                            match P2pMessage::from_bytes(&message.data) {
                                Ok(msg) => {
                                    if let Some(input) = as_server_input(msg) {
                                        let _ = self.inbound_tx.send(input).await;
                                    }
                                }
                                Err(e) => debug!(error = %e, "failed to decode gossip message"),
                            }
                        }
                        SwarmEvent::Behaviour(XlnBehaviourEvent::Identify(
                            identify::Event::Received { peer_id, info, .. },
                        )) => {
                            for addr in info.listen_addrs {
                                self.swarm.behaviour_mut().kademlia.add_address(&peer_id, addr);
                            }
                        }
                        SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                            debug!(peer = %peer_id, "connection established");
                        }
                        SwarmEvent::ConnectionClosed { peer_id, .. } => {
                            debug!(peer = %peer_id, "connection closed");
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Translate a gossip message into the `ServerInput` it feeds into the
/// local tick loop's ingress queue, if any. `FrameAnnounce`/`RequestFrame`/
/// `RequestTip` are sync-protocol messages with no direct `ServerInput`
/// counterpart; a node binary handles those separately against its
/// `StateDb`.
fn as_server_input(msg: P2pMessage) -> Option<ServerInput> {
    match msg {
        P2pMessage::SubmitEntityTx { entity_id, tx } => Some(ServerInput::SubmitEntityTx { entity_id, tx }),
        P2pMessage::ReceiveSignature { entity_id, signer, signature } => {
            Some(ServerInput::ReceiveSignature { entity_id, signer, signature })
        }
        P2pMessage::FrameAnnounce { .. } | P2pMessage::RequestFrame { .. } | P2pMessage::RequestTip => None,
    }
}
