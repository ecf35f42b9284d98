pub mod audio;
pub mod engine;
pub mod error;
pub mod input;
pub mod playback;
pub mod scheduler;
pub mod timing;
pub mod video;

pub mod prelude {
    pub use crate::audio::{AudioChunk, AudioPacer, AudioSink, SAMPLE_RATE, SAMPLES_PER_FRAME};
    pub use crate::engine::{Engine, EngineFactory};
    pub use crate::error::{EmulationFault, RomLoadError};
    pub use crate::input::{Button, ControllerState, InputAggregator, KeyMap};
    pub use crate::playback::{
        Command, PlaybackConfig, PlaybackController, PlaybackEvent, PlaybackState, TickOutcome,
    };
    pub use crate::scheduler::{FrameReport, FrameScheduler};
    pub use crate::timing::{Clock, FRAME_RATE, MonotonicClock, frame_period};
    pub use crate::video::{FRAME_BYTES, FRAME_HEIGHT, FRAME_WIDTH, FrameBuffer, VideoSink};
}
