mod end_to_end;
mod helpers;
mod ws_transport;
