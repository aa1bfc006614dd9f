mod bridge;
mod config;
mod credentials;
mod error;
mod playback;
mod settings;
mod socket;
