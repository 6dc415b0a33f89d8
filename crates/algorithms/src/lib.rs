//! # Windprep Algorithms
//!
//! Computational steps of the sample-preparation pipeline.
//!
//! ## Modules
//!
//! - **sampler**: rejection sampling of negative locations under a
//!   minimum-distance constraint
//! - **features**: feature vectors from sample geometry
//! - **classifier**: Gaussian signature classifiers and evaluation metrics
//! - **scripts**: templated Earth Engine prediction scripts

pub mod classifier;
pub mod features;
pub mod sampler;
pub mod scripts;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{
        maximum_likelihood, minimum_distance, signatures_from_training, train_test_split,
        ClassSignature, ConfusionMatrix,
    };
    pub use crate::features::geometric_features;
    pub use crate::sampler::{sample_negatives, SamplerParams};
    pub use crate::scripts::{asset_id, prediction_script, write_all_scripts, ScriptParams};
    pub use windprep_core::prelude::*;
}
