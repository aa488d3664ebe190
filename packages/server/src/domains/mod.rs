// Domain modules

pub mod review;
