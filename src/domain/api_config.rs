use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(default)]
pub struct ApiConfig {
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub students_path: String,
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
    #[validate(range(min = 1, max = 120))]
    pub connect_timeout_secs: u64,
}

impl ApiConfig {
    pub fn students_url(&self) -> String {
        let path = self.students_path.trim_start_matches('/');
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://onacademy-e2h7csembwhrf2bu.brazilsouth-01.azurewebsites.net"
                .to_string(),
            students_path: "/api/students/list".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
