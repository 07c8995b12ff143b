pub mod bot_controller;
pub mod home_controller;
