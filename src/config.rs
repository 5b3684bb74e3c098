use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NutritionConfig {
    pub calories_per_serving: f64,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub lookup_url: String,
    pub lookup_timeout: Duration,
    pub auth_url: String,
    pub nutrition: NutritionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            data_dir: PathBuf::from(".calotrack"),
            lookup_url: "http://127.0.0.1:8080/api".into(),
            lookup_timeout: Duration::from_secs(10),
            auth_url: "https://flybackend-misty-feather-6458.fly.dev".into(),
            nutrition: NutritionConfig {
                calories_per_serving: 280.0,
                source: "USDA FoodData Central".into(),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(d.port);
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or(d.host),
            port,
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.data_dir),
            lookup_url: std::env::var("LOOKUP_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{port}/api")),
            lookup_timeout: std::env::var("LOOKUP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(d.lookup_timeout),
            auth_url: std::env::var("AUTH_URL").unwrap_or(d.auth_url),
            nutrition: NutritionConfig {
                calories_per_serving: std::env::var("MOCK_CALORIES_PER_SERVING")
                    .ok()
                    .and_then(|v| v.parse::<f64>().ok())
                    .filter(|c| c.is_finite() && *c >= 0.0)
                    .unwrap_or(d.nutrition.calories_per_serving),
                source: std::env::var("MOCK_SOURCE").unwrap_or(d.nutrition.source),
            },
        })
    }
}
