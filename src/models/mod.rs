pub mod meeting;
pub mod member;
