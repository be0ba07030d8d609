mod client;
mod frame;
mod handshake;
mod response_wait;
mod support;
