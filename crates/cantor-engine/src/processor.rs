//! Audio-thread processor.
//!
//! [`AudioProcessor`] is moved into the output stream callback. Each block
//! it drains pending [`GraphCommand`]s, then renders frame by frame: pull
//! the input slot and the backing slot, run the graph, write the monitor
//! output, and feed the master mix to the visualization tap and, while
//! recording, to the recorder.

use crate::graph::{GraphFrame, VocalGraph};
use crate::source::{FilePlayer, FileRole, InputNode, PlaybackStatus};
use crate::tap::TapWriter;
use cantor_config::Settings;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;

/// Control-path requests, applied at the start of the next block.
pub(crate) enum GraphCommand {
    /// Retarget every node from a full snapshot.
    Apply(Settings),
    SetMonitor(bool),
    SetMonitorDelay(f32),
    /// Replace the input slot. The previous input is dropped first.
    ConnectInput(InputNode),
    /// Replace the backing slot.
    PlayBacking(FilePlayer),
    StopBacking,
    StartRecording(Sender<(f32, f32)>),
    StopRecording,
}

pub(crate) struct AudioProcessor {
    graph: VocalGraph,
    input: InputNode,
    backing: Option<FilePlayer>,
    commands: Receiver<GraphCommand>,
    tap: TapWriter,
    recorder: Option<Sender<(f32, f32)>>,
    status: Arc<PlaybackStatus>,
    out_ch: usize,
}

impl AudioProcessor {
    pub(crate) fn new(
        graph: VocalGraph,
        commands: Receiver<GraphCommand>,
        tap: TapWriter,
        status: Arc<PlaybackStatus>,
        out_ch: usize,
    ) -> Self {
        Self {
            graph,
            input: InputNode::None,
            backing: None,
            commands,
            tap,
            recorder: None,
            status,
            out_ch: out_ch.max(1),
        }
    }

    fn handle(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::Apply(settings) => {
                self.graph.apply(&settings);
                if let InputNode::Vocal(player) = &mut self.input {
                    player.set_detune(settings.pitch_shift);
                }
            }
            GraphCommand::SetMonitor(enabled) => self.graph.set_monitor(enabled),
            GraphCommand::SetMonitorDelay(seconds) => self.graph.set_monitor_delay(seconds),
            GraphCommand::ConnectInput(node) => {
                self.input = InputNode::None;
                self.input = node;
            }
            GraphCommand::PlayBacking(player) => {
                self.backing = None;
                self.backing = Some(player);
            }
            GraphCommand::StopBacking => self.backing = None,
            GraphCommand::StartRecording(tx) => self.recorder = Some(tx),
            GraphCommand::StopRecording => self.recorder = None,
        }
    }

    #[inline]
    fn next_backing(&mut self) -> (f32, f32) {
        let Some(player) = &mut self.backing else {
            return (0.0, 0.0);
        };
        match player.next_frame() {
            Some(frame) => frame,
            None => {
                self.status.mark_finished(FileRole::Backing, player.id());
                self.backing = None;
                (0.0, 0.0)
            }
        }
    }

    /// Process one interleaved output buffer.
    pub(crate) fn process_buffer(&mut self, data: &mut [f32]) {
        while let Ok(command) = self.commands.try_recv() {
            self.handle(command);
        }

        for frame in data.chunks_mut(self.out_ch) {
            let vocal = self.input.next_sample(&self.status);
            let backing = self.next_backing();
            let GraphFrame { output, mix } = self.graph.process(vocal, backing);

            match frame {
                [mono] => *mono = (output.0 + output.1) * 0.5,
                [left, right, rest @ ..] => {
                    *left = output.0;
                    *right = output.1;
                    rest.fill(0.0);
                }
                [] => {}
            }

            self.tap.push((mix.0 + mix.1) * 0.5);
            if let Some(tx) = &self.recorder {
                if let Err(TrySendError::Disconnected(_)) = tx.try_send(mix) {
                    self.recorder = None;
                }
            }
        }
    }
}
