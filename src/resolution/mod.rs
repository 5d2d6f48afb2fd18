pub mod country;
pub mod manager;
pub mod mappings;
pub mod name_matcher;
pub mod normalization;
pub mod organization;
pub mod subdivision;

pub use country::CountryResolver;
pub use manager::ResolutionPipeline;
pub use name_matcher::{fold, normalize, NameMapping};
pub use normalization::{NormalizationPass, NormalizationPlan};
pub use organization::OrganizationBackfiller;
pub use subdivision::SubdivisionResolver;
