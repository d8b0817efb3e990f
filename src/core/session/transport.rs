//! Transport session lifecycle over a WebRTC peer connection.
//!
//! The session is the offering side: it fetches an ephemeral credential,
//! builds a peer connection with the local capture track and a data channel,
//! then completes a single offer/answer round trip by POSTing the local
//! session description to the remote model endpoint and applying the returned
//! description as the answer. No renegotiation, ICE restart or retry.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_local::TrackLocal;

use super::media::{MediaSource, PlaybackSink};
use super::{EventSink, SessionHandle, credentials};
use crate::core::router::EventRouter;
use crate::errors::{SessionError, SessionResult};

/// Endpoints and identifiers for establishing a session.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Credential endpoint yielding the short-lived bearer secret
    pub token_url: String,
    /// Remote model session endpoint for the offer/answer exchange
    pub negotiation_url: String,
    /// Model variant identified in the negotiation request
    pub model: String,
    /// Label for the message channel
    pub channel_label: String,
}

/// Connection and channel handles owned by the active session.
struct ActiveConnection {
    peer: Arc<RTCPeerConnection>,
    channel: Arc<RTCDataChannel>,
}

/// The single active transport session.
///
/// Owns the peer connection and data channel between `start` and `stop`.
/// All other components talk to the wire through the shared [`SessionHandle`].
pub struct TransportSession {
    config: TransportConfig,
    http: reqwest::Client,
    handle: Arc<SessionHandle>,
    router: Arc<EventRouter>,
    media: Arc<dyn MediaSource>,
    playback: Arc<dyn PlaybackSink>,
    conn: Mutex<Option<ActiveConnection>>,
}

impl TransportSession {
    /// Create an inactive session around the shared handle and router.
    pub fn new(
        config: TransportConfig,
        handle: Arc<SessionHandle>,
        router: Arc<EventRouter>,
        media: Arc<dyn MediaSource>,
        playback: Arc<dyn PlaybackSink>,
    ) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            handle,
            router,
            media,
            playback,
            conn: Mutex::new(None),
        }
    }

    /// Establish connectivity: credential, media, peer connection, channel,
    /// offer/answer negotiation.
    ///
    /// Errors: `Credential` if the token cannot be obtained, `MediaAccess` if
    /// the capture track cannot be opened, `Handshake` if the negotiation
    /// exchange fails at any step. Failure leaves the session inactive and
    /// releases anything allocated along the way.
    pub async fn start(&self) -> SessionResult<()> {
        let mut conn = self.conn.lock().await;
        if conn.is_some() || self.handle.is_active() {
            return Err(SessionError::AlreadyActive);
        }

        let key = credentials::fetch_ephemeral_key(&self.http, &self.config.token_url).await?;
        let track = self.media.open_track().await?;

        let peer = build_peer_connection().await?;
        match self.wire_and_negotiate(&peer, track, &key).await {
            Ok(channel) => {
                tracing::info!(model = %self.config.model, "realtime session established");
                *conn = Some(ActiveConnection { peer, channel });
                Ok(())
            }
            Err(err) => {
                // Negotiation failed partway: release the connection before
                // surfacing the error.
                if let Err(close_err) = peer.close().await {
                    tracing::warn!(%close_err, "peer connection close failed during rollback");
                }
                Err(err)
            }
        }
    }

    /// Tear the session down.
    ///
    /// No-op when no session is active. Closes the channel, stops all
    /// locally-sourced senders and closes the connection; every release step
    /// runs even if an earlier one errors, and the first error is returned.
    pub async fn stop(&self) -> SessionResult<()> {
        let Some(active) = self.conn.lock().await.take() else {
            return Ok(());
        };

        self.handle.close_channel();

        let mut first_error: Option<SessionError> = None;
        let mut note = |step: &str, err: webrtc::Error| {
            tracing::warn!(step, %err, "teardown step failed");
            if first_error.is_none() {
                first_error = Some(SessionError::Handshake(format!("{step}: {err}")));
            }
        };

        if let Err(err) = active.channel.close().await {
            note("channel close", err);
        }
        for sender in active.peer.get_senders().await {
            if let Err(err) = sender.stop().await {
                note("track stop", err);
            }
        }
        if let Err(err) = active.peer.close().await {
            note("connection close", err);
        }

        tracing::info!("realtime session stopped");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Wire media and channel callbacks, then run the offer/answer exchange.
    async fn wire_and_negotiate(
        &self,
        peer: &Arc<RTCPeerConnection>,
        track: Arc<dyn TrackLocal + Send + Sync>,
        key: &str,
    ) -> SessionResult<Arc<RTCDataChannel>> {
        // Remote media output goes to the playback sink.
        let playback = self.playback.clone();
        peer.on_track(Box::new(move |remote, _receiver, _transceiver| {
            let playback = playback.clone();
            Box::pin(async move {
                tokio::spawn(async move {
                    while let Ok((packet, _)) = remote.read_rtp().await {
                        playback.play(packet.payload).await;
                    }
                    tracing::debug!("remote track ended");
                });
            })
        }));

        peer.add_track(track)
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))?;

        let channel = peer
            .create_data_channel(&self.config.channel_label, None)
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))?;

        // Channel-open attaches the sink, activates the session and clears
        // the log; channel-close detaches so late sends fail cleanly.
        let handle = self.handle.clone();
        let sink_channel = channel.clone();
        channel.on_open(Box::new(move || {
            Box::pin(async move {
                tracing::info!("message channel open");
                handle.open_channel(Arc::new(DataChannelSink {
                    channel: sink_channel,
                }));
            })
        }));

        let handle = self.handle.clone();
        channel.on_close(Box::new(move || {
            let handle = handle.clone();
            Box::pin(async move {
                tracing::info!("message channel closed");
                handle.close_channel();
            })
        }));

        let router = self.router.clone();
        channel.on_message(Box::new(move |message: DataChannelMessage| {
            let router = router.clone();
            Box::pin(async move {
                router.ingest(&message.data);
            })
        }));

        // Single round trip: offer out, answer back. Gathering completes
        // before the POST because the exchange is one-shot (no trickle).
        let offer = peer
            .create_offer(None)
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))?;
        let mut gathering_done = peer.gathering_complete_promise().await;
        peer.set_local_description(offer)
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))?;
        let _ = gathering_done.recv().await;

        let local = peer
            .local_description()
            .await
            .ok_or_else(|| SessionError::Handshake("no local description".to_string()))?;

        let answer_sdp = self.post_offer(&local.sdp, key).await?;
        let answer = RTCSessionDescription::answer(answer_sdp)
            .map_err(|e| SessionError::Handshake(e.to_string()))?;
        peer.set_remote_description(answer)
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))?;

        Ok(channel)
    }

    /// POST the local description to the model's session endpoint and return
    /// the remote description body.
    async fn post_offer(&self, sdp: &str, key: &str) -> SessionResult<String> {
        let url = format!("{}?model={}", self.config.negotiation_url, self.config.model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .header(reqwest::header::CONTENT_TYPE, "application/sdp")
            .body(sdp.to_owned())
            .send()
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Handshake(format!(
                "negotiation endpoint returned {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))
    }
}

/// Production [`EventSink`] writing to the data channel.
struct DataChannelSink {
    channel: Arc<RTCDataChannel>,
}

#[async_trait]
impl EventSink for DataChannelSink {
    async fn transmit(&self, payload: String) -> SessionResult<()> {
        self.channel
            .send_text(payload)
            .await
            .map(|_| ())
            .map_err(|_| SessionError::ChannelUnavailable)
    }
}

/// Build a peer connection with default codecs and interceptors.
async fn build_peer_connection() -> SessionResult<Arc<RTCPeerConnection>> {
    let mut media_engine = MediaEngine::default();
    media_engine
        .register_default_codecs()
        .map_err(|e| SessionError::Handshake(e.to_string()))?;
    let registry = register_default_interceptors(Registry::new(), &mut media_engine)
        .map_err(|e| SessionError::Handshake(e.to_string()))?;
    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();
    let peer = api
        .new_peer_connection(RTCConfiguration::default())
        .await
        .map_err(|e| SessionError::Handshake(e.to_string()))?;
    Ok(Arc::new(peer))
}
