//! Admission-time transformations

pub mod pod;
