pub mod df;
pub mod logging;
