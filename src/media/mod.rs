pub mod backend;
pub mod error;
pub mod frame;
pub mod stream;
pub mod synthetic;

pub use backend::{MediaBackend, MediaBackendConfig, MediaBackendFactory, MediaConstraints, MediaDevice};
pub use error::MediaError;
pub use frame::VideoFrame;
pub use stream::{DeviceStream, MediaBlob, MediaChunk, MediaTrack, TrackKind};
pub use synthetic::SyntheticBackend;
