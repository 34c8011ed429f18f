// Copyright @yucwang 2026

pub mod area;
pub mod constant;
pub mod directional;
