pub mod compose;
pub mod interaction;
pub mod live;
pub mod models;
pub mod notification;
pub mod overlay;
pub mod resolver;
pub mod task;
pub mod ui;
