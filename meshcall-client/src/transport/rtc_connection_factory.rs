use crate::media::{MediaHandle, MediaStream, MediaTrack, TrackKind, TrackSource};
use crate::peer::{ConnectionEvent, ConnectionFactory, PeerConnection};
use crate::transport::TransportConfig;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use meshcall_core::{IceCandidate, ParticipantId, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::media::Sample;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Builds webrtc-rs connections.
///
/// Local media tracks map to one `TrackLocalStaticSample` each, shared by every
/// connection, so a capture backend writes a sample once and all peers get it.
pub struct RtcConnectionFactory {
    config: TransportConfig,
    local_tracks: DashMap<String, Arc<TrackLocalStaticSample>>,
}

impl RtcConnectionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            local_tracks: DashMap::new(),
        }
    }

    /// The outbound track backing a local `MediaTrack`, once any connection has attached it.
    pub fn local_track(&self, track_id: &str) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks.get(track_id).map(|t| t.value().clone())
    }

    /// Feeds one captured sample to every connection carrying `track`.
    ///
    /// Returns `false` when the sample is dropped: the track is muted or ended,
    /// or no connection has attached it yet.
    pub async fn write_sample(&self, track: &MediaTrack, sample: &Sample) -> Result<bool> {
        if !track.is_enabled() || track.is_ended() {
            return Ok(false);
        }
        let Some(outbound) = self.local_track(track.id()) else {
            return Ok(false);
        };

        outbound
            .write_sample(sample)
            .await
            .with_context(|| format!("Failed to write {} sample", track.label()))?;
        Ok(true)
    }

    fn ice_servers(&self) -> Vec<RTCIceServer> {
        self.config
            .ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect()
    }

    fn outbound_track(
        &self,
        stream: &MediaStream,
        track: &MediaTrack,
    ) -> Arc<TrackLocalStaticSample> {
        self.local_tracks
            .entry(track.id().to_owned())
            .or_insert_with(|| {
                let capability = match track.kind() {
                    TrackKind::Audio => RTCRtpCodecCapability {
                        mime_type: MIME_TYPE_OPUS.to_owned(),
                        clock_rate: 48_000,
                        channels: 2,
                        ..Default::default()
                    },
                    TrackKind::Video => RTCRtpCodecCapability {
                        mime_type: MIME_TYPE_VP8.to_owned(),
                        clock_rate: 90_000,
                        ..Default::default()
                    },
                };
                Arc::new(TrackLocalStaticSample::new(
                    capability,
                    track.id().to_owned(),
                    stream.id().to_owned(),
                ))
            })
            .clone()
    }

    async fn attach_local_media(
        &self,
        remote_id: &ParticipantId,
        pc: &RTCPeerConnection,
        local_media: &MediaHandle,
    ) -> Result<()> {
        for track in local_media.tracks() {
            let outbound = self.outbound_track(local_media, track);
            let rtp_sender = pc
                .add_track(outbound as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .with_context(|| format!("Failed to add {} track", track.label()))?;

            // RTCP has to be read for interceptors like NACK to work.
            let remote_id = remote_id.clone();
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while rtp_sender.read(&mut rtcp_buf).await.is_ok() {}
                debug!("RTCP reader for {} stopped", remote_id);
            });
        }
        Ok(())
    }
}

impl Default for RtcConnectionFactory {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[async_trait]
impl ConnectionFactory for RtcConnectionFactory {
    async fn create(
        &self,
        remote_id: ParticipantId,
        local_media: MediaHandle,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: self.ice_servers(),
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        self.attach_local_media(&remote_id, &pc, &local_media).await?;

        let state_tx = events.clone();
        let uid_state = remote_id.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let uid = uid_state.clone();

            Box::pin(async move {
                info!("Connection state for {} changed: {}", uid, s);
                if s == RTCPeerConnectionState::Failed {
                    let _ = tx
                        .send(ConnectionEvent::Failed(uid, "ICE connectivity failed".to_owned()))
                        .await;
                }
            })
        }));

        let ice_tx = events.clone();
        let uid_ice = remote_id.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Failed to serialize local candidate for {}: {}", uid, e);
                        return;
                    }
                };
                let _ = tx
                    .send(ConnectionEvent::CandidateGenerated(uid, from_rtc_candidate(init)))
                    .await;
            })
        }));

        let remote_tracks: Arc<Mutex<Vec<(String, TrackKind)>>> = Arc::default();
        let track_tx = events;
        let uid_track = remote_id.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let uid = uid_track.clone();
            let remote_tracks = remote_tracks.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    other => {
                        debug!("Ignoring {:?} track from {}", other, uid);
                        return;
                    }
                };
                info!("Remote {:?} track {} from {}", kind, track.id(), uid);

                let stream = {
                    let mut seen = remote_tracks.lock().await;
                    seen.push((track.id(), kind));
                    let tracks = seen
                        .iter()
                        .map(|(id, kind)| {
                            MediaTrack::with_id(id.clone(), *kind, id.clone(), TrackSource::Remote)
                        })
                        .collect();
                    Arc::new(MediaStream::with_id(track.stream_id(), tracks))
                };

                let _ = tx.send(ConnectionEvent::RemoteStream(uid, stream)).await;
            })
        }));

        Ok(Arc::new(RtcPeerConnection { remote_id, pc }))
    }
}

pub struct RtcPeerConnection {
    remote_id: ParticipantId,
    pc: Arc<RTCPeerConnection>,
}

impl RtcPeerConnection {
    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }
}

#[async_trait]
impl PeerConnection for RtcPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        from_rtc_description(self.pc.create_offer(None).await?)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        from_rtc_description(self.pc.create_answer(None).await?)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc.set_local_description(to_rtc_description(desc)?).await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc
            .set_remote_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.pc
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.body)?,
        SdpType::Answer => RTCSessionDescription::answer(desc.body)?,
    };
    Ok(rtc)
}

fn from_rtc_description(desc: RTCSessionDescription) -> Result<SessionDescription> {
    match desc.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(desc.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(desc.sdp)),
        other => bail!("Unsupported description type {:?}", other),
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}
