pub mod distance_metric;
pub mod matrix_profile;
pub mod series;
pub mod subsequence;
