pub mod charts;
pub mod forecast;
pub mod health;
pub mod viewer;
