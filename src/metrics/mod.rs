pub mod absolute;
pub mod euclidean;
