//! Channel-backed sinks for hosts that render and play on other threads.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, unbounded};

use crate::{
    controller::{Button, ControllerEvent},
    error::HostBackendError,
    ppu::FrameBuffer,
    sink::{AudioSink, InputSource, VideoSink},
};

/// How long `present` waits for the host to hand a buffer back.
pub const PRESENT_TIMEOUT: Duration = Duration::from_secs(1);

/// Creates a frame queue `depth` buffers deep. The sink copies each frame
/// into a free buffer; the host must [`FrameReceiver::ack`] a buffer before
/// the sink can reuse it.
pub fn video_channel(depth: usize) -> (ChannelVideoSink, FrameReceiver) {
    let depth = depth.max(1);
    let (frame_tx, frame_rx) = bounded(depth);
    let (free_tx, free_rx) = bounded(depth);
    for _ in 0..depth {
        // Cannot fail: the channel was sized for exactly this many.
        let _ = free_tx.send(FrameBuffer::new());
    }
    (
        ChannelVideoSink {
            frames: frame_tx,
            free: free_rx,
            timeout: PRESENT_TIMEOUT,
        },
        FrameReceiver {
            frames: frame_rx,
            free: free_tx,
        },
    )
}

#[derive(Debug)]
pub struct ChannelVideoSink {
    frames: Sender<FrameBuffer>,
    free: Receiver<FrameBuffer>,
    timeout: Duration,
}

impl ChannelVideoSink {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl VideoSink for ChannelVideoSink {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), HostBackendError> {
        let mut buffer = match self.free.recv_timeout(self.timeout) {
            Ok(buffer) => buffer,
            Err(RecvTimeoutError::Timeout) => {
                return Err(HostBackendError::new(
                    "video",
                    "no frame buffer acknowledged in time",
                ));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(HostBackendError::new("video", "frame receiver dropped"));
            }
        };
        buffer.copy_from(frame);
        self.frames
            .send(buffer)
            .map_err(|_| HostBackendError::new("video", "frame receiver dropped"))
    }
}

/// Host end of [`video_channel`].
#[derive(Debug)]
pub struct FrameReceiver {
    frames: Receiver<FrameBuffer>,
    free: Sender<FrameBuffer>,
}

impl FrameReceiver {
    /// Blocks for the next frame. `None` once the sink is gone.
    pub fn recv(&self) -> Option<FrameBuffer> {
        self.frames.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<FrameBuffer> {
        self.frames.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<FrameBuffer> {
        match self.frames.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Returns a displayed buffer to the pool.
    pub fn ack(&self, frame: FrameBuffer) {
        // A closed pool means the sink is gone and nobody needs the buffer.
        let _ = self.free.send(frame);
    }
}

/// Creates a sample queue holding at most `capacity` samples. A full queue
/// blocks the core, which throttles emulation to the host's playback rate.
pub fn audio_channel(capacity: usize) -> (ChannelAudioSink, AudioReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (ChannelAudioSink { samples: tx }, AudioReceiver { samples: rx })
}

#[derive(Debug)]
pub struct ChannelAudioSink {
    samples: Sender<i16>,
}

impl AudioSink for ChannelAudioSink {
    fn push_samples(&mut self, samples: &[i16]) -> Result<(), HostBackendError> {
        for &sample in samples {
            self.samples
                .send(sample)
                .map_err(|_| HostBackendError::new("audio", "sample receiver dropped"))?;
        }
        Ok(())
    }
}

/// Host end of [`audio_channel`].
#[derive(Debug)]
pub struct AudioReceiver {
    samples: Receiver<i16>,
}

impl AudioReceiver {
    pub fn recv_timeout(&self, timeout: Duration) -> Option<i16> {
        self.samples.recv_timeout(timeout).ok()
    }

    /// Appends everything queued so far to `out` and returns how many
    /// samples were taken.
    pub fn drain_into(&self, out: &mut Vec<i16>) -> usize {
        let before = out.len();
        out.extend(self.samples.try_iter());
        out.len() - before
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub fn input_channel() -> (InputSender, ChannelInputSource) {
    let (tx, rx) = unbounded();
    (InputSender { events: tx }, ChannelInputSource { events: rx })
}

/// Cloneable handle input backends report button changes through.
#[derive(Debug, Clone)]
pub struct InputSender {
    events: Sender<ControllerEvent>,
}

impl InputSender {
    pub fn send(&self, event: ControllerEvent) -> Result<(), HostBackendError> {
        self.events
            .send(event)
            .map_err(|_| HostBackendError::new("input", "core dropped the input source"))
    }

    pub fn press(&self, port: u8, button: Button) -> Result<(), HostBackendError> {
        self.send(ControllerEvent::new(port, button, true))
    }

    pub fn release(&self, port: u8, button: Button) -> Result<(), HostBackendError> {
        self.send(ControllerEvent::new(port, button, false))
    }
}

#[derive(Debug)]
pub struct ChannelInputSource {
    events: Receiver<ControllerEvent>,
}

impl InputSource for ChannelInputSource {
    fn poll(&mut self) -> Option<ControllerEvent> {
        self.events.try_recv().ok()
    }
}
