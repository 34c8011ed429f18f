// Copyright @yucwang 2026

pub mod henyey_greenstein;
pub mod isotropic;
