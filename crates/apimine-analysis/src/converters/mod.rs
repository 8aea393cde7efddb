//! Converters: Collection → Collection clustering strategies.
//!
//! Each converter is one pipeline stage. Converters never mutate their
//! input; they poll the checkpoint they are handed and report interruption
//! through `ConvertError::Interrupt`.

pub mod inclusion;
pub mod same_content;
pub mod type_intersection;
pub mod unknown_eliminator;

use apimine_core::constants::{
    KNOWN_STAGES, STAGE_ELIMINATE_UNKNOWNS, STAGE_INCLUSION_ORDERING, STAGE_INCLUSION_STRUCTURAL,
    STAGE_INCLUSION_UNKNOWN, STAGE_SAME_CONTENT, STAGE_TYPE_INTERSECTION,
};
use apimine_core::errors::ConvertError;
use apimine_core::Checkpoint;

use crate::collection::Collection;

pub use inclusion::{
    Containment, InclusionClusterer, OrderingInclusion, StructuralInclusion, TieBreak,
    UnknownInclusion,
};
pub use same_content::{ContentKey, SameContentClusterer, WeightlessContent};
pub use type_intersection::TypeIntersectionClusterer;
pub use unknown_eliminator::UnknownEliminator;

/// A clustering stage.
pub trait Converter: Send + Sync {
    /// Stage name as used in configuration.
    fn name(&self) -> &'static str;

    fn convert(&self, input: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError>;
}

/// Create a converter by stage name.
pub fn create_converter(name: &str, tie_break: TieBreak) -> Option<Box<dyn Converter>> {
    match name {
        STAGE_SAME_CONTENT => Some(Box::new(SameContentClusterer::weightless())),
        STAGE_ELIMINATE_UNKNOWNS => Some(Box::new(UnknownEliminator::new())),
        STAGE_INCLUSION_STRUCTURAL => Some(Box::new(InclusionClusterer::new(
            STAGE_INCLUSION_STRUCTURAL,
            StructuralInclusion,
            tie_break,
        ))),
        STAGE_INCLUSION_UNKNOWN => Some(Box::new(InclusionClusterer::new(
            STAGE_INCLUSION_UNKNOWN,
            UnknownInclusion,
            tie_break,
        ))),
        STAGE_INCLUSION_ORDERING => Some(Box::new(InclusionClusterer::new(
            STAGE_INCLUSION_ORDERING,
            OrderingInclusion,
            tie_break,
        ))),
        STAGE_TYPE_INTERSECTION => Some(Box::new(TypeIntersectionClusterer)),
        _ => None,
    }
}

/// All stage names `create_converter` understands.
pub fn available_converters() -> &'static [&'static str] {
    &KNOWN_STAGES
}
