//! Playback engine for a terminal music player: a FIFO track queue consumed by one audio
//! thread, transport controls shared with the UI, and render snapshots for the visualizer.

pub mod config;
pub mod decode;
pub mod error;
pub mod features;
pub mod listing;
pub mod logging;
pub mod output;
pub mod player;
pub mod queue;
pub mod render;
pub mod track;
pub mod transport;
pub mod worker;

pub use error::{ConfigError, OutputInitError, PlaybackError};
pub use player::{Command, Controls, Player};
pub use render::{Refresh, RenderChannel, RenderState};
pub use track::Track;
pub use transport::{TransportState, VisualizationMode};
