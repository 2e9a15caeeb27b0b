//! Generated gRPC types for the beer eligibility service.
//!
//! `beer.proto` is compiled at build time with `protox` (no `protoc` needed).

pub mod beer {
    tonic::include_proto!("beer");
}

/// Fully-qualified gRPC path of `BeerService/check`.
pub const CHECK_METHOD: &str = "/beer.BeerService/check";
