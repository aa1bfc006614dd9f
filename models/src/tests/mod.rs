mod device;
mod message;
mod shortcut;
