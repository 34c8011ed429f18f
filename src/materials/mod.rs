// Copyright @yucwang 2023

pub mod diffuse;
pub mod null;
pub mod smooth_conductor;
pub mod smooth_dielectric;
