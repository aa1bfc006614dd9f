mod bridge;
mod helpers;
mod playback;
mod settings;
mod shortcuts;
mod socket;
mod watcher;
