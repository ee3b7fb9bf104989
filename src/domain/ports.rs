use crate::domain::model::GeocodeOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 地理編碼服務的抽象；`Err` 代表無法解讀的回應，該列本次不寫入
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodeOutcome>;
}
