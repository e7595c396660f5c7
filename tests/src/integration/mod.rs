//! # Integration Scenarios

#[cfg(test)]
mod fixtures;

mod config_flow;
mod routing_flow;
mod transmission_flow;
