// Slicing layer
pub mod bounding_box;
pub mod contour_finder;
pub mod slice_extractor;
pub mod slice_validator;

// Cluster layer
pub mod cluster_counter;
pub mod density_clusterer;

// Shared per-pixel building blocks
pub mod masks;
pub mod pixel;
