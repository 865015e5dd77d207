pub mod errors;
pub mod ivp;
pub mod timeseries;
pub mod trajectory;
