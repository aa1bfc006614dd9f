mod command;
mod device;
mod executable;
