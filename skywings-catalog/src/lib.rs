pub mod fleet;
pub mod pricing;
pub mod seatmap;

pub use fleet::{AircraftType, CabinClass, ClassBand, FleetError, Seat, SeatSpec};
pub use pricing::{FarePassenger, FareRequest, PriceBreakdown, PricingConfig, PricingEngine, PricingError};
pub use seatmap::{SeatMap, SeatSelection};
