mod http_transport;

pub use http_transport::{map_reqwest_error, HttpTransport};
