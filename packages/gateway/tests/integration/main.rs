mod auth;
mod common;
mod generate;
mod history;
mod media;
