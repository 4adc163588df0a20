use bytes::Bytes;
use dashmap::DashMap;
use huddle_core::media::{LocalTrack, TrackKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

pub const STREAM_ID: &str = "huddle";

const OPUS_FRAME: Duration = Duration::from_millis(20);
/// A single Opus frame that decodes to 20 ms of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    match kind {
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
            rtcp_feedback: vec![],
        },
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            rtcp_feedback: vec![],
        },
    }
}

/// Owns the webrtc-rs track objects behind every [`LocalTrack`] id.
///
/// The engine only passes ids around; connections resolve them here when a
/// track is attached or swapped.
#[derive(Default)]
pub struct TrackRegistry {
    tracks: DashMap<String, Arc<TrackLocalStaticSample>>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sample-fed track. `label` prefixes the generated id.
    pub fn create(&self, kind: TrackKind, label: &str) -> LocalTrack {
        let id = format!("{}-{}", label, Uuid::new_v4().simple());
        let track = Arc::new(TrackLocalStaticSample::new(
            codec_for(kind),
            id.clone(),
            STREAM_ID.to_owned(),
        ));
        self.tracks.insert(id.clone(), track);
        LocalTrack::new(id, kind)
    }

    pub fn get(&self, id: &str) -> Option<Arc<TrackLocalStaticSample>> {
        self.tracks.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.tracks.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Feeds Opus silence into an audio track while it is enabled, until
    /// `cancel` fires. Returns `None` for unknown ids.
    pub fn spawn_silence(
        &self,
        track: &LocalTrack,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        let sample_track = self.get(track.id())?;
        let local = track.clone();

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(OPUS_FRAME);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if !local.is_enabled() {
                            continue;
                        }
                        let sample = Sample {
                            data: Bytes::from_static(&OPUS_SILENCE),
                            duration: OPUS_FRAME,
                            ..Default::default()
                        };
                        if let Err(e) = sample_track.write_sample(&sample).await {
                            debug!("Dropped silence frame on {}: {}", local.id(), e);
                        }
                    }
                }
            }
        }))
    }
}
