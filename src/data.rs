//! Exchange-rate data: the rate cache and the sources feeding it

pub mod fx;
pub mod sources;
