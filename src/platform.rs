//! Website integrations.

pub mod naver;
