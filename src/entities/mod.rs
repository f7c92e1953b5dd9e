pub mod address;
pub mod color;
mod location;
mod map;
mod route;
pub mod session;

pub use address::{AddressRecord, Attribute};
pub use color::{ColorBy, ColorScale};
pub use location::{Bounds, Coordinates, LocationGroup, SearchFocus};
pub use map::{AttributeListing, LocationMap, Marker};
pub use route::{Leg, RouteResult, Stop, StopMarker};
pub use session::{Session, Status as SessionStatus};
