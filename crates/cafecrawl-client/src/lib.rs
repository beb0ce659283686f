pub mod config;
pub mod kakao;

pub use config::KakaoConfig;
pub use kakao::KakaoClient;
