pub mod blob;
pub mod blob_selector;
pub mod cancellation;
pub mod color_segmenter;
pub mod command;
pub mod display;
pub mod frame_source;
pub mod motion_arbiter;
