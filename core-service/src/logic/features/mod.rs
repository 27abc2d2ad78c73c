//! Features Module - Channel layout and versioned vectors
//!
//! The 52-channel TEP layout is the contract shared by training,
//! persisted artifacts and inference.

pub mod layout;
pub mod vector;

pub use layout::{
    feature_index, layout_hash, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION,
    FLOW_CHANNEL, PRESSURE_CHANNEL, TEMPERATURE_CHANNEL,
};
pub use vector::FeatureVector;
