//! Playback controller state machine
//!
//! Owns the play/pause phase, the current album, and the device volume, and
//! issues commands to the remote playback service. The dispatch loop owns
//! the controller exclusively, so state never races and at most one remote
//! call is in flight at a time.
//!
//! Every remote call is best-effort: a failure reverts the controller to a
//! safe state (Paused for play, the prior value for volume) and is surfaced
//! as a diagnostic, never retried.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use tagbox_common::events::{EventBus, PlaybackPhase, PlayerEvent};

use crate::catalog::AlbumEntry;
use crate::remote::{PlaybackService, ServiceError};

/// Volume step applied by the volume buttons, in percent
const VOLUME_STEP: u8 = 10;

/// Tuning knobs for the controller
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Rejection window shared by the transport and volume buttons
    pub debounce: Duration,
    /// Bound on any single remote call
    pub call_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// The jukebox playback state machine
///
/// One instance exists per process; there is exactly one output device, so
/// one controller owns all mutable playback state for the process lifetime.
pub struct Controller<S> {
    service: S,
    events: EventBus,
    settings: ControllerSettings,
    phase: PlaybackPhase,
    current: Option<AlbumEntry>,
    /// Device volume in percent; None until seeded from the service
    volume: Option<u8>,
    /// When the last button input was accepted; shared by all three buttons
    last_input: Option<Instant>,
}

impl<S: PlaybackService> Controller<S> {
    /// Create a controller in the initial Paused phase.
    ///
    /// No playback session is assumed until the remote service confirms one.
    pub fn new(service: S, events: EventBus, settings: ControllerSettings) -> Self {
        Self {
            service,
            events,
            settings,
            phase: PlaybackPhase::Paused,
            current: None,
            volume: None,
            last_input: None,
        }
    }

    /// Current playback phase
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Album currently playing, if any
    pub fn current(&self) -> Option<&AlbumEntry> {
        self.current.as_ref()
    }

    /// Device volume in percent, None until seeded
    pub fn volume(&self) -> Option<u8> {
        self.volume
    }

    /// Start the given album on the output device.
    ///
    /// Transfers playback to the device, then starts the album context, in
    /// that order. Valid from any phase. Any failure leaves the controller
    /// Paused; the next tag read starts over. On the first successful play
    /// the device volume is seeded from the service.
    pub async fn play(&mut self, entry: &AlbumEntry, resume: bool) {
        info!(artist = %entry.artist, title = %entry.title, "starting album");

        let transfer = self
            .call("transfer_playback", self.service.transfer_playback(resume))
            .await;
        if let Err(err) = transfer {
            self.fail_safe("transfer_playback", err);
            return;
        }

        let start = self
            .call("start_playback", self.service.start_playback(&entry.uri))
            .await;
        if let Err(err) = start {
            self.fail_safe("start_playback", err);
            return;
        }

        self.set_phase(PlaybackPhase::Playing);
        self.current = Some(entry.clone());
        self.events.emit_lossy(PlayerEvent::AlbumStarted {
            index: entry.index,
            artist: entry.artist.clone(),
            title: entry.title.clone(),
            timestamp: Utc::now(),
        });

        if self.volume.is_none() {
            self.seed_volume().await;
        }
    }

    /// Flip between Playing and Paused. Debounced.
    ///
    /// On failure the phase is left unchanged; the operator can press again
    /// after the debounce window.
    pub async fn toggle_transport(&mut self) {
        if !self.accept_input() {
            return;
        }

        match self.phase {
            PlaybackPhase::Playing => {
                debug!("pausing playback");
                let result = self
                    .call("pause_playback", self.service.pause_playback())
                    .await;
                match result {
                    Ok(()) => self.set_phase(PlaybackPhase::Paused),
                    Err(err) => self.report_failure("pause_playback", err),
                }
            }
            PlaybackPhase::Paused => {
                debug!("resuming playback");
                let result = self
                    .call("transfer_playback", self.service.transfer_playback(true))
                    .await;
                match result {
                    Ok(()) => self.set_phase(PlaybackPhase::Playing),
                    Err(err) => self.report_failure("transfer_playback", err),
                }
            }
        }
    }

    /// Raise the volume one step. Debounced; a step past 100 is a no-op.
    pub async fn volume_up(&mut self) {
        self.adjust_volume(VOLUME_STEP as i16).await;
    }

    /// Lower the volume one step. Debounced; a step below 0 is a no-op.
    pub async fn volume_down(&mut self) {
        self.adjust_volume(-(VOLUME_STEP as i16)).await;
    }

    async fn adjust_volume(&mut self, delta: i16) {
        if !self.accept_input() {
            return;
        }

        let Some(current) = self.volume else {
            debug!("volume not yet known, ignoring volume button");
            return;
        };

        let target = current as i16 + delta;
        if !(0..=100).contains(&target) {
            // At the boundary the step is dropped entirely, not clamped.
            debug!(current, delta, "volume step would leave range, ignoring");
            return;
        }
        let target = target as u8;

        self.volume = Some(target);
        let result = self
            .call("set_volume", self.service.set_volume(target))
            .await;
        match result {
            Ok(()) => {
                info!(volume = target, "volume changed");
                self.events.emit_lossy(PlayerEvent::VolumeChanged {
                    volume: target,
                    timestamp: Utc::now(),
                });
            }
            Err(err) => {
                self.volume = Some(current);
                self.report_failure("set_volume", err);
            }
        }
    }

    /// Seed the volume from the service, rounded down to a multiple of 10
    /// so the buttons step through round values afterwards.
    async fn seed_volume(&mut self) {
        let result = self
            .call("current_playback", self.service.current_playback())
            .await;
        match result {
            Ok(status) => {
                let snapped = (status.volume_percent.min(100) / VOLUME_STEP) * VOLUME_STEP;
                debug!(reported = status.volume_percent, snapped, "seeded volume");
                self.volume = Some(snapped);
            }
            // Playback already started; a failed seed only delays volume
            // control until the next play.
            Err(err) => self.report_failure("current_playback", err),
        }
    }

    /// Gate for the three button operations. Returns false and leaves the
    /// shared timestamp untouched when the press lands inside the debounce
    /// window of the previously accepted press.
    fn accept_input(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_input {
            if now.duration_since(last) < self.settings.debounce {
                debug!("input within debounce window, ignoring");
                return false;
            }
        }
        self.last_input = Some(now);
        true
    }

    async fn call<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        match timeout(self.settings.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Network(format!(
                "{operation} timed out after {:?}",
                self.settings.call_timeout
            ))),
        }
    }

    fn set_phase(&mut self, new_phase: PlaybackPhase) {
        if self.phase == new_phase {
            return;
        }
        let old_phase = self.phase;
        self.phase = new_phase;
        info!(%old_phase, %new_phase, "playback phase changed");
        self.events.emit_lossy(PlayerEvent::PlaybackStateChanged {
            old_phase,
            new_phase,
            timestamp: Utc::now(),
        });
    }

    fn fail_safe(&mut self, operation: &str, err: ServiceError) {
        self.set_phase(PlaybackPhase::Paused);
        self.report_failure(operation, err);
    }

    fn report_failure(&self, operation: &str, err: ServiceError) {
        warn!(operation, error = %err, "remote call failed");
        self.events.emit_lossy(PlayerEvent::RemoteCallFailed {
            operation: operation.to_string(),
            reason: err.to_string(),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{PlaybackStatus, ServiceResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tagbox_common::TagId;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Transfer(bool),
        Start(String),
        Pause,
        SetVolume(u8),
        Status,
    }

    /// Service double: records calls, fails the operations it is told to,
    /// and reports a fixed status volume.
    struct ScriptedService {
        calls: Mutex<Vec<Call>>,
        fail_transfer: bool,
        fail_start: bool,
        fail_pause: bool,
        fail_set_volume: bool,
        fail_status: bool,
        hang_pause: bool,
        status_volume: u8,
    }

    impl Default for ScriptedService {
        fn default() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_transfer: false,
                fail_start: false,
                fail_pause: false,
                fail_set_volume: false,
                fail_status: false,
                hang_pause: false,
                status_volume: 73,
            }
        }
    }

    impl ScriptedService {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn fail(&self, flag: bool, operation: &str) -> ServiceResult<()> {
            if flag {
                Err(ServiceError::Network(format!("{operation} refused")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PlaybackService for ScriptedService {
        async fn transfer_playback(&self, resume: bool) -> ServiceResult<()> {
            self.record(Call::Transfer(resume));
            self.fail(self.fail_transfer, "transfer_playback")
        }

        async fn start_playback(&self, context_uri: &str) -> ServiceResult<()> {
            self.record(Call::Start(context_uri.to_string()));
            self.fail(self.fail_start, "start_playback")
        }

        async fn pause_playback(&self) -> ServiceResult<()> {
            self.record(Call::Pause);
            if self.hang_pause {
                std::future::pending::<()>().await;
            }
            self.fail(self.fail_pause, "pause_playback")
        }

        async fn set_volume(&self, percent: u8) -> ServiceResult<()> {
            self.record(Call::SetVolume(percent));
            self.fail(self.fail_set_volume, "set_volume")
        }

        async fn current_playback(&self) -> ServiceResult<PlaybackStatus> {
            self.record(Call::Status);
            if self.fail_status {
                return Err(ServiceError::Network("status refused".to_string()));
            }
            Ok(PlaybackStatus {
                volume_percent: self.status_volume,
                is_playing: true,
            })
        }
    }

    fn controller(service: ScriptedService) -> Controller<ScriptedService> {
        Controller::new(
            service,
            EventBus::new(16),
            ControllerSettings {
                debounce: Duration::from_secs(1),
                call_timeout: Duration::from_secs(5),
            },
        )
    }

    fn album() -> AlbumEntry {
        AlbumEntry {
            index: 0,
            tag_id: TagId::parse("0000000000000000").unwrap(),
            uri: "spotify:album:0fWLW9j35eQTrOb8mHcnyX".to_string(),
            artist: "Megadeth".to_string(),
            title: "Rust in Peace".to_string(),
        }
    }

    fn calls(ctl: &Controller<ScriptedService>) -> Vec<Call> {
        ctl.service.calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_play_success_sets_playing_and_seeds_volume() {
        let mut ctl = controller(ScriptedService::default());

        ctl.play(&album(), false).await;

        assert_eq!(ctl.phase(), PlaybackPhase::Playing);
        assert_eq!(ctl.current().unwrap().title, "Rust in Peace");
        // Reported 73 snaps down to 70
        assert_eq!(ctl.volume(), Some(70));
        assert_eq!(
            calls(&ctl),
            vec![
                Call::Transfer(false),
                Call::Start("spotify:album:0fWLW9j35eQTrOb8mHcnyX".to_string()),
                Call::Status,
            ]
        );
    }

    #[tokio::test]
    async fn test_play_does_not_reseed_known_volume() {
        let mut ctl = controller(ScriptedService::default());
        ctl.volume = Some(40);

        ctl.play(&album(), false).await;

        assert_eq!(ctl.volume(), Some(40));
        assert!(!calls(&ctl).contains(&Call::Status));
    }

    #[tokio::test]
    async fn test_play_failure_on_transfer_leaves_paused() {
        let mut ctl = controller(ScriptedService {
            fail_transfer: true,
            ..Default::default()
        });
        let mut rx = ctl.events.subscribe();

        ctl.play(&album(), false).await;

        assert_eq!(ctl.phase(), PlaybackPhase::Paused);
        assert!(ctl.current().is_none());
        // start_playback never issued after the transfer failed
        assert_eq!(calls(&ctl), vec![Call::Transfer(false)]);
        match rx.try_recv().unwrap() {
            PlayerEvent::RemoteCallFailed { operation, .. } => {
                assert_eq!(operation, "transfer_playback");
            }
            other => panic!("expected RemoteCallFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_play_failure_on_start_reverts_playing_to_paused() {
        let mut ctl = controller(ScriptedService {
            fail_start: true,
            ..Default::default()
        });
        ctl.phase = PlaybackPhase::Playing;

        ctl.play(&album(), false).await;

        assert_eq!(ctl.phase(), PlaybackPhase::Paused);
    }

    #[tokio::test]
    async fn test_play_seed_failure_still_plays() {
        let mut ctl = controller(ScriptedService {
            fail_status: true,
            ..Default::default()
        });

        ctl.play(&album(), false).await;

        assert_eq!(ctl.phase(), PlaybackPhase::Playing);
        assert_eq!(ctl.volume(), None);
    }

    #[tokio::test]
    async fn test_toggle_from_paused_resumes() {
        let mut ctl = controller(ScriptedService::default());

        ctl.toggle_transport().await;

        assert_eq!(ctl.phase(), PlaybackPhase::Playing);
        assert_eq!(calls(&ctl), vec![Call::Transfer(true)]);
    }

    #[tokio::test]
    async fn test_toggle_from_playing_pauses() {
        let mut ctl = controller(ScriptedService::default());
        ctl.phase = PlaybackPhase::Playing;

        ctl.toggle_transport().await;

        assert_eq!(ctl.phase(), PlaybackPhase::Paused);
        assert_eq!(calls(&ctl), vec![Call::Pause]);
    }

    #[tokio::test]
    async fn test_toggle_failure_leaves_phase_unchanged() {
        let mut ctl = controller(ScriptedService {
            fail_pause: true,
            ..Default::default()
        });
        ctl.phase = PlaybackPhase::Playing;

        ctl.toggle_transport().await;

        assert_eq!(ctl.phase(), PlaybackPhase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_debounced_within_window() {
        let mut ctl = controller(ScriptedService::default());

        ctl.toggle_transport().await;
        tokio::time::advance(Duration::from_millis(100)).await;
        ctl.toggle_transport().await;

        // Second press 0.1s later is a no-op: one remote call, phase as
        // after the first press
        assert_eq!(calls(&ctl), vec![Call::Transfer(true)]);
        assert_eq!(ctl.phase(), PlaybackPhase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_accepted_after_window() {
        let mut ctl = controller(ScriptedService::default());

        ctl.toggle_transport().await;
        tokio::time::advance(Duration::from_millis(1100)).await;
        ctl.toggle_transport().await;

        assert_eq!(calls(&ctl), vec![Call::Transfer(true), Call::Pause]);
        assert_eq!(ctl.phase(), PlaybackPhase::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_window_shared_across_buttons() {
        let mut ctl = controller(ScriptedService::default());
        ctl.volume = Some(50);

        ctl.toggle_transport().await;
        tokio::time::advance(Duration::from_millis(200)).await;
        ctl.volume_up().await;

        // Volume press rejected by the transport press's window
        assert_eq!(calls(&ctl), vec![Call::Transfer(true)]);
        assert_eq!(ctl.volume(), Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_press_does_not_extend_window() {
        let mut ctl = controller(ScriptedService::default());

        ctl.toggle_transport().await;
        tokio::time::advance(Duration::from_millis(900)).await;
        ctl.toggle_transport().await; // rejected, must not reset the window
        tokio::time::advance(Duration::from_millis(200)).await;
        ctl.toggle_transport().await; // 1.1s after the accepted press

        assert_eq!(calls(&ctl), vec![Call::Transfer(true), Call::Pause]);
    }

    #[tokio::test]
    async fn test_volume_up_success() {
        let mut ctl = controller(ScriptedService::default());
        ctl.volume = Some(50);

        ctl.volume_up().await;

        assert_eq!(ctl.volume(), Some(60));
        assert_eq!(calls(&ctl), vec![Call::SetVolume(60)]);
    }

    #[tokio::test]
    async fn test_volume_up_at_max_is_noop() {
        let mut ctl = controller(ScriptedService::default());
        ctl.volume = Some(100);

        ctl.volume_up().await;

        assert_eq!(ctl.volume(), Some(100));
        assert!(calls(&ctl).is_empty());
    }

    #[tokio::test]
    async fn test_volume_down_at_min_is_noop() {
        let mut ctl = controller(ScriptedService::default());
        ctl.volume = Some(0);

        ctl.volume_down().await;

        assert_eq!(ctl.volume(), Some(0));
        assert!(calls(&ctl).is_empty());
    }

    #[tokio::test]
    async fn test_volume_failure_rolls_back() {
        let mut ctl = controller(ScriptedService {
            fail_set_volume: true,
            ..Default::default()
        });
        ctl.volume = Some(50);
        let mut rx = ctl.events.subscribe();

        ctl.volume_down().await;

        assert_eq!(ctl.volume(), Some(50));
        assert_eq!(calls(&ctl), vec![Call::SetVolume(40)]);
        match rx.try_recv().unwrap() {
            PlayerEvent::RemoteCallFailed { operation, .. } => {
                assert_eq!(operation, "set_volume");
            }
            other => panic!("expected RemoteCallFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_volume_unknown_is_noop() {
        let mut ctl = controller(ScriptedService::default());

        ctl.volume_up().await;

        assert_eq!(ctl.volume(), None);
        assert!(calls(&ctl).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_remote_call_times_out() {
        let mut ctl = controller(ScriptedService {
            hang_pause: true,
            ..Default::default()
        });
        ctl.phase = PlaybackPhase::Playing;
        let mut rx = ctl.events.subscribe();

        // The paused clock auto-advances past the 5s call timeout
        ctl.toggle_transport().await;

        assert_eq!(ctl.phase(), PlaybackPhase::Playing);
        match rx.try_recv().unwrap() {
            PlayerEvent::RemoteCallFailed { reason, .. } => {
                assert!(reason.contains("timed out"), "reason: {reason}");
            }
            other => panic!("expected RemoteCallFailed, got {other:?}"),
        }
    }
}
