// Domain layer: recipients, reports and the ports the batch controller drives.

pub mod model;
pub mod ports;
