//! The engine aggregate: lifecycle, sources, sinks and latency mode.
//!
//! An [`Engine`] is either unbuilt or built. Building creates the
//! [`VocalGraph`], replays the last applied settings with an instant settle,
//! and opens the output stream with an [`AudioProcessor`] inside its
//! callback. From then on every control operation is a [`GraphCommand`]
//! sent to the audio thread, so nothing on the control path blocks the
//! stream or steps a parameter.
//!
//! Operations that need the graph build it on first use. Changing the
//! latency mode tears the whole instance down and builds a new one.

use crate::error::{EngineError, Result};
use crate::graph::{MAX_MONITOR_DELAY, VocalGraph};
use crate::processor::{AudioProcessor, GraphCommand};
use crate::profiler::ProfileHandle;
use crate::recorder::{Recorder, Recording};
use crate::source::{ActiveSource, FilePlayer, FileRole, InputNode, PlaybackStatus};
use crate::tap::VisualizationTap;
use cantor_config::{EngineConfig, LatencyMode, Settings};
use cantor_io::{
    AudioBackend, BackendStreamConfig, CaptureProcessing, DecodedBuffer, StreamHandle,
};
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Depth of the microphone queue between the input and output callbacks.
pub const MIC_QUEUE: usize = 16384;

/// How a file playback starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackOptions {
    /// Restart from the top when the file ends
    pub looping: bool,
    /// Vocal role only: turn the monitor path on or off
    pub monitor: bool,
}

/// Input slot as the control path sees it.
enum InputSlot {
    None,
    Microphone(StreamHandle),
    Vocal { id: u64 },
}

/// Handles into a running graph.
struct LiveGraph {
    _output: StreamHandle,
    commands: Sender<GraphCommand>,
    tap: Arc<VisualizationTap>,
    status: Arc<PlaybackStatus>,
    input: InputSlot,
    backing: Option<u64>,
    monitoring: bool,
}

impl LiveGraph {
    fn send(&self, command: GraphCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("audio callback is gone, command dropped");
        }
    }

    fn set_monitor(&mut self, enabled: bool) {
        self.send(GraphCommand::SetMonitor(enabled));
        self.monitoring = enabled;
    }

    fn input_source(&self) -> ActiveSource {
        match self.input {
            InputSlot::None => ActiveSource::None,
            InputSlot::Microphone(_) => ActiveSource::Microphone,
            InputSlot::Vocal { id } if self.status.is_finished(FileRole::Vocal, id) => {
                ActiveSource::None
            }
            InputSlot::Vocal { .. } => ActiveSource::VocalTrack,
        }
    }

    fn bypass_source(&self) -> ActiveSource {
        match self.backing {
            Some(id) if !self.status.is_finished(FileRole::Backing, id) => {
                ActiveSource::BackingTrack
            }
            _ => ActiveSource::None,
        }
    }

    /// Forget playbacks the audio thread has reported finished.
    fn refresh(&mut self) {
        let vocal_slot = matches!(self.input, InputSlot::Vocal { .. });
        if vocal_slot && self.input_source() == ActiveSource::None {
            tracing::debug!("vocal playback ended");
            self.input = InputSlot::None;
        }
        if self.bypass_source() == ActiveSource::None && self.backing.is_some() {
            tracing::debug!("backing playback ended");
            self.backing = None;
        }
    }
}

enum EngineState {
    Unbuilt,
    Built(LiveGraph),
}

/// Live vocal-processing engine.
///
/// # Example
///
/// ```rust
/// use cantor_config::{EngineConfig, Settings};
/// use cantor_engine::Engine;
/// use cantor_io::OfflineBackend;
///
/// let (backend, driver) = OfflineBackend::new();
/// let mut engine = Engine::new(Box::new(backend), EngineConfig::default());
///
/// engine.apply_settings(&Settings { reverb_mix: 0.3, ..Settings::default() });
/// engine.init().unwrap();
///
/// let block = driver.render(128);
/// assert_eq!(block.len(), 256);
/// ```
pub struct Engine {
    backend: Box<dyn AudioBackend>,
    config: EngineConfig,
    mode: LatencyMode,
    settings: Settings,
    monitor_delay: f32,
    backing: Option<Arc<DecodedBuffer>>,
    vocal: Option<Arc<DecodedBuffer>>,
    recorder: Recorder,
    next_playback: u64,
    state: EngineState,
}

impl Engine {
    /// An unbuilt engine on `backend`. Nothing is opened until first use.
    pub fn new(backend: Box<dyn AudioBackend>, config: EngineConfig) -> Self {
        Self {
            backend,
            mode: config.latency_mode,
            monitor_delay: config.monitor_delay_secs(),
            recorder: Recorder::new(config.sample_rate),
            config,
            settings: Settings::default(),
            backing: None,
            vocal: None,
            next_playback: 0,
            state: EngineState::Unbuilt,
        }
    }

    /// Build the graph if it is not built yet.
    pub fn init(&mut self) -> Result<()> {
        self.ensure_built()
    }

    /// Destroy the graph and close the streams. Loaded buffers and the last
    /// settings survive; an active recording is finalized.
    pub fn teardown(&mut self) {
        let state = std::mem::replace(&mut self.state, EngineState::Unbuilt);
        if let EngineState::Built(live) = state {
            if self.recorder.is_recording() {
                tracing::info!("finalizing recording before teardown");
                self.recorder.stop();
            }
            drop(live);
            tracing::info!(mode = %self.mode, "engine torn down");
        }
    }

    /// True while a graph is running.
    pub fn is_built(&self) -> bool {
        matches!(self.state, EngineState::Built(_))
    }

    /// Current latency mode.
    pub fn latency_mode(&self) -> LatencyMode {
        self.mode
    }

    /// Engine sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The backend streams are opened on.
    pub fn backend(&self) -> &dyn AudioBackend {
        self.backend.as_ref()
    }

    /// The last applied settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply a full settings snapshot.
    ///
    /// The engine keeps its own copy, replayed on every rebuild. The most
    /// recent call determines every smoothed target.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.settings = *settings;
        if let Some(live) = self.live() {
            live.send(GraphCommand::Apply(*settings));
        }
        tracing::debug!("settings applied");
    }

    /// Switch latency mode by rebuilding the engine.
    ///
    /// Records whether monitoring was on and whether the microphone was the
    /// live input, tears the instance down, builds a new one in `mode`
    /// (replaying the last settings), then reacquires the microphone with
    /// the recorded monitor state. File playback is not resumed.
    ///
    /// On a failed build the engine stays unbuilt and keeps its previous
    /// mode.
    pub fn set_latency_mode(&mut self, mode: LatencyMode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }

        let (was_monitoring, microphone_active) = match self.live() {
            Some(live) => (
                live.monitoring,
                live.input_source() == ActiveSource::Microphone,
            ),
            None => (false, false),
        };

        self.teardown();
        let live = self.build(mode).map_err(|source| {
            tracing::error!(mode = %mode, error = %source, "rebuild failed");
            EngineError::Rebuild { mode, source }
        })?;
        self.state = EngineState::Built(live);
        self.mode = mode;
        tracing::info!(mode = %mode, buffer_size = mode.buffer_size(), "latency mode changed");

        if microphone_active {
            self.use_microphone(was_monitoring)?;
        }
        Ok(())
    }

    /// Make the microphone the input, replacing any vocal playback or
    /// previous capture.
    ///
    /// Capture is requested raw: echo cancellation, noise suppression and
    /// auto gain are off. If the device cannot be opened nothing changes.
    pub fn use_microphone(&mut self, monitor: bool) -> Result<()> {
        self.ensure_built()?;

        let channels = self.config.input_channels.max(1);
        let buffer_size = self.mode.buffer_size();
        let config = BackendStreamConfig {
            sample_rate: self.config.sample_rate,
            buffer_size,
            channels,
            device_name: self.config.input_device.clone(),
            processing: CaptureProcessing::RAW,
        };

        let (tx, rx) = crossbeam_channel::bounded::<f32>(MIC_QUEUE);
        // One block of slack so the output never waits on the input.
        for _ in 0..buffer_size {
            let _ = tx.try_send(0.0);
        }
        let frame_len = usize::from(channels);
        let callback = Box::new(move |data: &[f32]| {
            for frame in data.chunks(frame_len) {
                let mono = frame.iter().sum::<f32>() / frame.len() as f32;
                let _ = tx.try_send(mono);
            }
        });
        let on_error = Box::new(|err: &str| tracing::warn!(error = err, "input stream error"));

        let handle = self
            .backend
            .build_input_stream(&config, callback, on_error)
            .map_err(|e| {
                tracing::warn!(error = %e, "microphone unavailable");
                EngineError::Acquisition(e)
            })?;

        if let Some(live) = self.live() {
            live.send(GraphCommand::ConnectInput(InputNode::Microphone(rx)));
            live.input = InputSlot::Microphone(handle);
            live.set_monitor(monitor);
            tracing::info!(monitor, "microphone connected");
        }
        Ok(())
    }

    /// Disconnect and release the microphone. No-op if it is not the input.
    pub fn stop_microphone(&mut self) {
        if let Some(live) = self.live() {
            if matches!(live.input, InputSlot::Microphone(_)) {
                live.send(GraphCommand::ConnectInput(InputNode::None));
                live.input = InputSlot::None;
                tracing::info!("microphone released");
            }
        }
    }

    /// Decode a file into the buffer for `role`.
    ///
    /// On failure the previously loaded buffer stays.
    pub fn load_file(&mut self, role: FileRole, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let buffer =
            cantor_io::decode_file(path, self.config.sample_rate).map_err(EngineError::Decode)?;
        tracing::info!(%role, path = %path.display(), frames = buffer.frames(), "file loaded");
        self.set_buffer(role, buffer);
        Ok(())
    }

    /// Decode container bytes into the buffer for `role`. `extension` is a
    /// format hint such as `"mp3"`.
    ///
    /// On failure the previously loaded buffer stays.
    pub fn load_bytes(
        &mut self,
        role: FileRole,
        bytes: Vec<u8>,
        extension: Option<&str>,
    ) -> Result<()> {
        let buffer = cantor_io::decode_bytes(bytes, extension, self.config.sample_rate)
            .map_err(EngineError::Decode)?;
        tracing::info!(%role, frames = buffer.frames(), "buffer loaded");
        self.set_buffer(role, buffer);
        Ok(())
    }

    /// Replace the buffer for `role` with already decoded audio at the
    /// engine rate. A running playback keeps the buffer it started with.
    pub fn set_buffer(&mut self, role: FileRole, buffer: DecodedBuffer) {
        let slot = match role {
            FileRole::Backing => &mut self.backing,
            FileRole::Vocal => &mut self.vocal,
        };
        *slot = Some(Arc::new(buffer));
    }

    /// True if a buffer is loaded for `role`.
    pub fn has_buffer(&self, role: FileRole) -> bool {
        match role {
            FileRole::Backing => self.backing.is_some(),
            FileRole::Vocal => self.vocal.is_some(),
        }
    }

    /// Start playing the buffer loaded for `role` from the top.
    ///
    /// Backing replaces any running backing playback and skips the effects.
    /// Vocal replaces the input slot, releasing the microphone, and plays
    /// detuned by the current pitch shift. With nothing loaded this does
    /// nothing.
    pub fn use_file(&mut self, role: FileRole, options: PlaybackOptions) -> Result<()> {
        let buffer = match role {
            FileRole::Backing => self.backing.clone(),
            FileRole::Vocal => self.vocal.clone(),
        };
        let Some(buffer) = buffer else {
            tracing::debug!(%role, "nothing loaded, play ignored");
            return Ok(());
        };

        self.ensure_built()?;
        self.next_playback += 1;
        let id = self.next_playback;
        let sample_rate = self.config.sample_rate as f32;
        let detune = match role {
            FileRole::Backing => 0.0,
            FileRole::Vocal => self.settings.pitch_shift,
        };
        let player = FilePlayer::new(buffer, detune, options.looping, id, sample_rate);

        if let Some(live) = self.live() {
            match role {
                FileRole::Backing => {
                    live.send(GraphCommand::PlayBacking(player));
                    live.backing = Some(id);
                }
                FileRole::Vocal => {
                    live.send(GraphCommand::ConnectInput(InputNode::Vocal(player)));
                    live.input = InputSlot::Vocal { id };
                    live.set_monitor(options.monitor);
                }
            }
            tracing::info!(%role, looping = options.looping, "playback started");
        }
        Ok(())
    }

    /// Play the backing buffer, optionally looping.
    pub fn play_backing(&mut self, looping: bool) -> Result<()> {
        self.use_file(
            FileRole::Backing,
            PlaybackOptions {
                looping,
                monitor: false,
            },
        )
    }

    /// Play the vocal buffer through the effects.
    pub fn play_vocal(&mut self, monitor: bool) -> Result<()> {
        self.use_file(
            FileRole::Vocal,
            PlaybackOptions {
                looping: false,
                monitor,
            },
        )
    }

    /// Stop playback for `role`. No-op if it is not playing.
    pub fn stop(&mut self, role: FileRole) {
        let Some(live) = self.live() else {
            return;
        };
        match role {
            FileRole::Backing if live.backing.is_some() => {
                live.send(GraphCommand::StopBacking);
                live.backing = None;
            }
            FileRole::Vocal if matches!(live.input, InputSlot::Vocal { .. }) => {
                live.send(GraphCommand::ConnectInput(InputNode::None));
                live.input = InputSlot::None;
            }
            _ => return,
        }
        tracing::info!(%role, "playback stopped");
    }

    /// What feeds the effects chain.
    pub fn input_source(&self) -> ActiveSource {
        match &self.state {
            EngineState::Built(live) => live.input_source(),
            EngineState::Unbuilt => ActiveSource::None,
        }
    }

    /// What bypasses the effects chain.
    pub fn bypass_source(&self) -> ActiveSource {
        match &self.state {
            EngineState::Built(live) => live.bypass_source(),
            EngineState::Unbuilt => ActiveSource::None,
        }
    }

    /// Turn the monitor output on or off. No-op while unbuilt.
    pub fn set_monitor(&mut self, enabled: bool) {
        if let Some(live) = self.live() {
            live.set_monitor(enabled);
        }
    }

    /// True if the monitor path is on.
    pub fn is_monitoring(&self) -> bool {
        matches!(&self.state, EngineState::Built(live) if live.monitoring)
    }

    /// Delay the monitor path by `seconds`, clamped to `0..=0.2`. Kept
    /// across rebuilds.
    pub fn set_monitor_delay(&mut self, seconds: f32) {
        self.monitor_delay = seconds.clamp(0.0, MAX_MONITOR_DELAY);
        let delay = self.monitor_delay;
        if let Some(live) = self.live() {
            live.send(GraphCommand::SetMonitorDelay(delay));
        }
    }

    /// Current monitor delay in seconds.
    pub fn monitor_delay(&self) -> f32 {
        self.monitor_delay
    }

    /// Start capturing the master mix. No-op if already recording.
    pub fn start_recording(&mut self) -> Result<()> {
        self.ensure_built()?;
        match self.recorder.start() {
            Ok(Some(tx)) => {
                if let Some(live) = self.live() {
                    live.send(GraphCommand::StartRecording(tx));
                }
                Ok(())
            }
            Ok(None) => {
                tracing::debug!("already recording");
                Ok(())
            }
            Err(e) => Err(EngineError::Recorder(e)),
        }
    }

    /// Stop capturing; the recording finalizes in the background. No-op if
    /// not recording.
    pub fn stop_recording(&mut self) {
        if !self.recorder.is_recording() {
            return;
        }
        if let Some(live) = self.live() {
            live.send(GraphCommand::StopRecording);
        }
        self.recorder.stop();
    }

    /// True between start and stop.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// The finalized recording, once stop has completed finalization.
    pub fn recording(&mut self) -> Option<Recording> {
        self.recorder.recording()
    }

    /// Wait up to `timeout` for the finalized recording.
    pub fn wait_for_recording(&mut self, timeout: Duration) -> Option<Recording> {
        self.recorder.wait(timeout)
    }

    /// The visualization tap of the running graph.
    pub fn visualization_tap(&self) -> Option<Arc<VisualizationTap>> {
        match &self.state {
            EngineState::Built(live) => Some(Arc::clone(&live.tap)),
            EngineState::Unbuilt => None,
        }
    }

    /// Profile the master mix for `duration`.
    ///
    /// Resolves with the zero fingerprint if the engine is unbuilt or is
    /// torn down before the profile completes.
    pub fn profile(&self, duration: Duration) -> ProfileHandle {
        let tap = match &self.state {
            EngineState::Built(live) => Arc::downgrade(&live.tap),
            EngineState::Unbuilt => std::sync::Weak::new(),
        };
        ProfileHandle::spawn(tap, duration)
    }

    /// Profile for the configured duration.
    pub fn profile_default(&self) -> ProfileHandle {
        self.profile(Duration::from_millis(self.config.profile_duration_ms))
    }

    fn live(&mut self) -> Option<&mut LiveGraph> {
        match &mut self.state {
            EngineState::Built(live) => {
                live.refresh();
                Some(live)
            }
            EngineState::Unbuilt => None,
        }
    }

    fn ensure_built(&mut self) -> Result<()> {
        if matches!(self.state, EngineState::Unbuilt) {
            let live = self.build(self.mode)?;
            self.state = EngineState::Built(live);
        }
        Ok(())
    }

    fn build(&self, mode: LatencyMode) -> cantor_io::Result<LiveGraph> {
        let sample_rate = self.config.sample_rate as f32;
        let mut graph = VocalGraph::new(sample_rate);
        graph.apply(&self.settings);
        graph.set_monitor_delay(self.monitor_delay);
        graph.settle();

        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let (tap, tap_writer) = VisualizationTap::new(sample_rate);
        let status = Arc::new(PlaybackStatus::default());
        let channels = self.config.output_channels.max(1);
        let mut processor = AudioProcessor::new(
            graph,
            commands_rx,
            tap_writer,
            Arc::clone(&status),
            usize::from(channels),
        );

        let config = BackendStreamConfig {
            sample_rate: self.config.sample_rate,
            buffer_size: mode.buffer_size(),
            channels,
            device_name: self.config.output_device.clone(),
            processing: CaptureProcessing::RAW,
        };
        let actual = self.backend.actual_sample_rate(&config);
        if actual != config.sample_rate {
            tracing::warn!(
                requested = config.sample_rate,
                actual,
                "device runs at a different sample rate"
            );
        }

        let output = self.backend.build_output_stream(
            &config,
            Box::new(move |data: &mut [f32]| processor.process_buffer(data)),
            Box::new(|err: &str| tracing::warn!(error = err, "output stream error")),
        )?;
        tracing::info!(
            backend = self.backend.name(),
            mode = %mode,
            buffer_size = config.buffer_size,
            "engine built"
        );

        Ok(LiveGraph {
            _output: output,
            commands: commands_tx,
            tap: Arc::new(tap),
            status,
            input: InputSlot::None,
            backing: None,
            monitoring: false,
        })
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.backend.name())
            .field("mode", &self.mode)
            .field("built", &self.is_built())
            .field("input", &self.input_source())
            .field("bypass", &self.bypass_source())
            .field("recording", &self.is_recording())
            .finish_non_exhaustive()
    }
}
