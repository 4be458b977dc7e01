pub mod stage1_match;
pub mod stage2_curve;
pub mod stage3_scan;
pub mod stage4_rank;
