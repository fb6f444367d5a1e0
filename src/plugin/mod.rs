pub mod arrange;
pub mod framer;
pub mod selection;
pub mod timestamp;

pub use framer::{FrameRequest, FramingOutcome, NO_IMAGES_MESSAGE, frame_images};
pub use selection::selection_summary;
