//! Task bounded context: domain model, persistence ports, adapters, and the
//! task store service.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
