pub mod config;
pub mod error;
pub mod events;
pub mod playback;
pub mod processing;
pub mod queue;
pub mod scan;
pub mod slideshow;
pub mod tasks {
    pub mod files;
    pub mod viewer;
}
