pub mod access;
pub mod auth;
pub mod comment;
pub mod media;
pub mod notification;
pub mod project;
pub mod review;
pub mod track;
