//! Host collaborators at the core boundary.
//!
//! The core pushes completed frames and resampled audio out through these
//! traits and pulls controller events in. Backends run on their own threads;
//! [`channel`] has adapters that bridge them over bounded crossbeam channels.
//! A sink that keeps failing is detached by the [`Core`](crate::Core) after
//! [`CoreConfig::max_sink_failures`](crate::config::CoreConfig) consecutive
//! errors, and emulation carries on without it.

pub mod channel;

use crate::{controller::ControllerEvent, error::HostBackendError, ppu::FrameBuffer};

pub use channel::{
    AudioReceiver, ChannelAudioSink, ChannelInputSource, ChannelVideoSink, FrameReceiver,
    InputSender, audio_channel, input_channel, video_channel,
};

/// Consumer of completed frames of palette indices.
pub trait VideoSink: Send {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), HostBackendError>;
}

/// Consumer of signed 16-bit mono samples at the configured host rate.
pub trait AudioSink: Send {
    fn push_samples(&mut self, samples: &[i16]) -> Result<(), HostBackendError>;
}

/// Non-blocking source of controller transitions, polled once per frame.
pub trait InputSource: Send {
    fn poll(&mut self) -> Option<ControllerEvent>;
}

impl<F> VideoSink for F
where
    F: FnMut(&FrameBuffer) -> Result<(), HostBackendError> + Send,
{
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), HostBackendError> {
        self(frame)
    }
}

impl<F> AudioSink for F
where
    F: FnMut(&[i16]) -> Result<(), HostBackendError> + Send,
{
    fn push_samples(&mut self, samples: &[i16]) -> Result<(), HostBackendError> {
        self(samples)
    }
}
