pub mod city;
pub mod itinerary;
pub mod preference;
pub mod trip;
pub mod user;

pub use city::City;
pub use itinerary::ItineraryRecord;
pub use preference::{PreferenceAudit, PreferenceDraft, PreferenceInput};
pub use trip::{NewTrip, Trip};
pub use user::{User, UserProfile};
