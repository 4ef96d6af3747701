// ==========================================
// 订阅配送管理系统 - 城市/配送中心映射
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCenter {
    #[serde(default)]
    pub id: Option<String>,
    pub city: String,
    pub centers: Vec<String>,
}

impl CityCenter {
    pub fn new(city: &str, centers: &[&str]) -> Self {
        Self {
            id: None,
            city: city.to_string(),
            centers: centers.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// 初始城市与配送中心映射
pub fn seed_city_centers() -> Vec<CityCenter> {
    vec![
        CityCenter::new(
            "Allahabad",
            &["Naini", "Jhunsi - 1", "Jhunsi - 2", "Bamrauli", "Sancho", "Teliyerganj"],
        ),
        CityCenter::new(
            "Aligarh",
            &["Eath chungi", "Nivri Mod", "Nagla Giridhari", "Tala nagri"],
        ),
        CityCenter::new(
            "Agra",
            &["Madhu Nagar", "Taddy bagiya", "Bichpuri", "Dauki", "Cantt", "Raunakta"],
        ),
        CityCenter::new(
            "Bareilly",
            &["Kara", "Nakatiya", "Kunatanda", "Bhuta", "Banijariya", "Faiznagar"],
        ),
        CityCenter::new("Dehradun", &["Sabhawala", "Langha Road", "Shankarpur"]),
        CityCenter::new(
            "Meerut",
            &[
                "Badholi", "Atrada", "Bijoli", "Mundali", "Javri", "Rotha", "Jisori",
                "Kharkhoda", "Pahadpur", "Mohadinpure", "Kathwari", "Kishanpur",
            ],
        ),
    ]
}
