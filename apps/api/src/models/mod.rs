pub mod activity;
pub mod interview;
pub mod profile;
pub mod roadmap;
pub mod user;
