pub mod chat;
pub mod mbti;
pub mod user;
