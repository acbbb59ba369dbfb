//! Market identity resolution: fuzzy-matching venue markets into
//! canonical cross-venue clusters.

pub mod normalize;
pub mod resolver;
pub mod similarity;

pub use resolver::MarketIdentityResolver;
