pub mod completions;
pub mod create;
pub mod dashboard;
pub mod delete;
pub mod landing;
pub mod list;
pub mod login;
pub mod logout;
pub mod register;
pub mod show;
pub mod status;
pub mod update;
