pub mod credential;
pub mod history_record;
pub mod session;
pub mod video_operation;
