pub mod network;
pub mod panels;
pub mod plot;
