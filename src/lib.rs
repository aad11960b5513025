#![doc = include_str!("../README.md")]

mod descriptor;
mod error;
pub mod indices;
pub mod kdtree;
pub mod matching;
mod r#type;

pub use descriptor::{descr_dist_sq, Descriptor, Feature, LocationKind};
pub use error::{DescriptorIndexError, Result};
pub use r#type::{DescriptorNum, Point, Rect};

#[cfg(test)]
pub(crate) mod test;
