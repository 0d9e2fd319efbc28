pub mod kakao;

pub use kakao::KakaoGeocoder;
