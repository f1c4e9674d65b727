pub mod accounts;
pub mod cities;
pub mod planner;
pub mod trips;
