pub mod half_open;
pub mod thresholds;
