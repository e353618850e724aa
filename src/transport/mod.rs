pub mod connector;
pub mod http;
pub mod stdio;
pub mod traits;

pub use connector::{ConnectFailure, ConnectOutcome, ConnectorState, TransportConnector, TransportFailure};
pub use http::HttpTransport;
pub use stdio::StdioTransport;
pub use traits::{Transport, TransportKind, TransportSession};
