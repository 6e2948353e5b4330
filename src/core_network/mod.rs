pub mod pasv;
pub mod poll;
pub mod port;
