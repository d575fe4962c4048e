pub mod error;
pub mod framing;
pub mod protocol;
pub mod server;

pub use error::ServerError;
pub use server::ClearslotServer;
