//! Builders to construct facilities from configuration.

pub mod facility_builder;

pub use facility_builder::FacilityBuilder;
