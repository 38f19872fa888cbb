//! Cross-crate integration scenarios. All tests run on tokio's paused clock,
//! so backoff waits cost no wall time.

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod method_flows;
#[cfg(test)]
mod rendezvous_flows;
#[cfg(test)]
mod runtime_flows;
