//! # Node Status
//!
//! Status vocabulary capabilities report to the host's status display.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fill colour of the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Red,
    Green,
    Blue,
    Yellow,
    Grey,
}

/// Operational status of a capability node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Client not resolved yet, resolution failed, or node closed.
    Disconnected,
    /// Client resolved and idle.
    Connected,
    /// Sending a message to a module output.
    Sent,
    /// Processing a message from a module input.
    Received,
    /// Pushing reported twin properties.
    Reported,
    /// Processing a desired-properties patch.
    Desired,
    /// Processing a direct method invocation.
    Method,
    /// Sending a direct method response.
    Response,
    /// The last operation failed.
    Error,
}

impl NodeStatus {
    pub fn fill(&self) -> StatusFill {
        match self {
            Self::Disconnected => StatusFill::Red,
            Self::Connected => StatusFill::Green,
            Self::Sent | Self::Reported | Self::Response => StatusFill::Blue,
            Self::Received | Self::Desired | Self::Method => StatusFill::Yellow,
            Self::Error => StatusFill::Grey,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connected => "Connected",
            Self::Sent => "Sending message",
            Self::Received => "Receiving message",
            Self::Reported => "Sending reported properties",
            Self::Desired => "Receiving desired properties",
            Self::Method => "Receiving direct method",
            Self::Response => "Sending method response",
            Self::Error => "Error",
        }
    }

    /// Indicator as rendered by the host status display.
    pub fn indicator(&self) -> StatusIndicator {
        StatusIndicator {
            fill: self.fill(),
            shape: "dot",
            text: self.text(),
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Status display record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusIndicator {
    pub fill: StatusFill,
    pub shape: &'static str,
    pub text: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_colours() {
        assert_eq!(NodeStatus::Disconnected.fill(), StatusFill::Red);
        assert_eq!(NodeStatus::Connected.fill(), StatusFill::Green);
        assert_eq!(NodeStatus::Response.fill(), StatusFill::Blue);
        assert_eq!(NodeStatus::Method.fill(), StatusFill::Yellow);
        assert_eq!(NodeStatus::Error.fill(), StatusFill::Grey);
    }

    #[test]
    fn test_indicator() {
        let indicator = NodeStatus::Reported.indicator();
        assert_eq!(indicator.shape, "dot");
        assert_eq!(indicator.text, "Sending reported properties");
        assert_eq!(NodeStatus::Sent.to_string(), "Sending message");
    }
}
