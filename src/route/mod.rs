pub mod ai;
pub mod docs;
pub mod health;
pub mod model;
pub mod post;
