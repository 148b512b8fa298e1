pub mod features;
pub mod health;
pub mod predict;
