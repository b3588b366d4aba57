pub mod client_map;
