use crate::domain::model::{Body, Coordinates};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 星曆來源：給定 UTC 時刻與天體，回傳視黃經 (度, [0, 360))
#[async_trait]
pub trait EphemerisProvider: Send + Sync {
    async fn longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64>;

    /// Backend name recorded in profile metadata.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: EphemerisProvider + ?Sized> EphemerisProvider for Box<T> {
    async fn longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64> {
        (**self).longitude(instant, body).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str) -> Result<Coordinates>;
}

#[async_trait]
pub trait TimezoneLookup: Send + Sync {
    /// IANA zone name for the given coordinates.
    async fn timezone_at(&self, coordinates: Coordinates) -> Result<String>;
}
