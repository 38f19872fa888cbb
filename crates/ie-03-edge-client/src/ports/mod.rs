//! Ports: the host surface (inbound) and the edge transport (outbound).

pub mod inbound;
pub mod outbound;

pub use inbound::NodeSurface;
pub use outbound::{
    ConnectivityHandle, ConnectivityProvider, InboundMessage, MethodCall, MethodRequest,
    MethodResponder, MethodResponse, OutboundMessage, StateHandle, TwinProperties,
    JSON_CONTENT_TYPE, UTF8_CONTENT_ENCODING,
};
