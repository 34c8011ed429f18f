// Copyright @yucwang 2026

pub mod activation;
pub mod free_flight;
pub mod heterogeneous_medium;
pub mod homogeneous_medium;
pub mod spectral_medium;
