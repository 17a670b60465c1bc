pub mod file;
pub mod torrent;
