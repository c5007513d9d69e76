//! External collaborators
//!
//! Postcode lookup and recipe generation, each behind a trait so the
//! operations can run against stubs.

pub mod generator;
pub mod geocoder;

pub use generator::{OpenAiGenerator, RecipeGenerator};
pub use geocoder::{Geocoder, PostcodesIo};
