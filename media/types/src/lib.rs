/*!
    Shared vocabulary for the streamgate crate family.

    This crate defines the types that cross crate boundaries — stream
    descriptors, recipes, frame contexts, the error taxonomy, the session
    shutdown token and the environment configuration. It has no dependency
    on FFmpeg, so signaling-side consumers can depend on it without linking
    the native libraries.
*/

mod codec;
mod config;
mod error;
mod frame;
mod recipe;
mod request;
mod shutdown;

pub use codec::{Codec, MediaType, StreamDescriptor, StreamInfo};
pub use config::Config;
pub use error::{Error, Result};
pub use frame::{MediaFrameContext, Message, MessageKind, METADATA_CHANNEL_ID};
pub use recipe::{
    Appetizer, BitstreamFilterName, CodecOption, ContainerFormat, InputOption, MediaTask, Recipe,
    SampleFormat, StreamFilter, TaskAction,
};
pub use request::Request;
pub use shutdown::Shutdown;
