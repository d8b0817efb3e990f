//! Media seams at the device boundary.
//!
//! Device handling is outside this crate's scope: embedders provide a
//! [`MediaSource`] that yields the local capture track and a [`PlaybackSink`]
//! that consumes remote audio frames. The defaults here let the console run
//! headless (negotiating an audio line without touching any device).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::errors::SessionResult;

/// Provider of the locally-sourced audio track attached to the connection.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Open local capture and return the track to attach.
    ///
    /// Fails with `MediaAccess` when capture cannot be acquired.
    async fn open_track(&self) -> SessionResult<Arc<dyn TrackLocal + Send + Sync>>;
}

/// Consumer of remote audio frames from the model.
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Handle one remote audio frame payload.
    async fn play(&self, frame: Bytes);
}

/// Headless media source: an opus track with no device behind it.
///
/// Lets the session negotiate an audio line without microphone access.
#[derive(Debug, Default)]
pub struct SilenceSource;

#[async_trait]
impl MediaSource for SilenceSource {
    async fn open_track(&self) -> SessionResult<Arc<dyn TrackLocal + Send + Sync>> {
        let track = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "audio".to_owned(),
            "voicerag-mic".to_owned(),
        );
        Ok(Arc::new(track))
    }
}

/// Playback sink that discards remote audio.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl PlaybackSink for NullSink {
    async fn play(&self, _frame: Bytes) {}
}
