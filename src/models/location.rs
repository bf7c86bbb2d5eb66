use serde::{Deserialize, Serialize};

/// A device fix, a province centroid or a single route point.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Both axes within `epsilon` degrees of each other.
    pub fn is_near(&self, other: &Coordinates, epsilon: f64) -> bool {
        (self.latitude - other.latitude).abs() < epsilon
            && (self.longitude - other.longitude).abs() < epsilon
    }
}

/// Province id meaning "search around the device location".
pub const NEAR_ME: &str = "near_me";

pub const FALLBACK_PROVINCE: &str = "Ha Noi";

pub const PROVINCE_CENTROIDS: &[(&str, Coordinates)] = &[
    ("Ho Chi Minh", Coordinates::new(10.772357, 106.697882)),
    ("Ha Noi", Coordinates::new(21.036810, 105.834709)),
    ("Da Nang", Coordinates::new(16.061242, 108.224176)),
    ("Lam Dong", Coordinates::new(11.938080, 108.444818)),
    ("Ha Giang", Coordinates::new(22.8233, 104.9836)),
    ("Cao Bang", Coordinates::new(22.6657, 106.2550)),
    ("Lang Son", Coordinates::new(21.8562, 106.7615)),
    ("Lao Cai", Coordinates::new(22.4800, 103.9790)),
    ("Yen Bai", Coordinates::new(21.7050, 104.8720)),
    ("Tuyen Quang", Coordinates::new(21.8236, 105.2140)),
    ("Thai Nguyen", Coordinates::new(21.5672, 105.8252)),
    ("Phu Tho", Coordinates::new(21.3227, 105.4010)),
    ("Bac Kan", Coordinates::new(22.1457, 105.8348)),
    ("Quang Ninh", Coordinates::new(20.9713, 107.0448)),
    ("Bac Giang", Coordinates::new(21.2810, 106.1973)),
    ("Bac Ninh", Coordinates::new(21.1861, 106.0763)),
    ("Vinh Phuc", Coordinates::new(21.3609, 105.5474)),
    ("Hai Duong", Coordinates::new(20.9393, 106.3305)),
    ("Hai Phong", Coordinates::new(20.8449, 106.6881)),
    ("Hung Yen", Coordinates::new(20.6463, 106.0511)),
    ("Thai Binh", Coordinates::new(20.4470, 106.3366)),
    ("Nam Dinh", Coordinates::new(20.4200, 106.1680)),
    ("Ninh Binh", Coordinates::new(20.2500, 105.9740)),
    ("Thanh Hoa", Coordinates::new(20.1290, 105.3130)),
    ("Nghe An", Coordinates::new(18.6756, 105.6983)),
    ("Ha Tinh", Coordinates::new(18.3420, 105.9057)),
    ("Quang Binh", Coordinates::new(17.4688, 106.6223)),
    ("Quang Tri", Coordinates::new(16.8190, 107.1050)),
    ("Thua Thien Hue", Coordinates::new(16.4637, 107.5909)),
    ("Quang Nam", Coordinates::new(15.5730, 108.4800)),
    ("Quang Ngai", Coordinates::new(15.120029, 108.792743)),
    ("Binh Dinh", Coordinates::new(13.7797, 109.2196)),
    ("Phu Yen", Coordinates::new(13.0955, 109.3209)),
    ("Khanh Hoa", Coordinates::new(12.2388, 109.1967)),
    ("Ninh Thuan", Coordinates::new(11.5670, 108.9886)),
    ("Binh Thuan", Coordinates::new(10.9804, 108.2615)),
    ("Kon Tum", Coordinates::new(14.3498, 108.0000)),
    ("Gia Lai", Coordinates::new(13.8070, 108.1098)),
    ("Dak Lak", Coordinates::new(12.6675, 108.0383)),
    ("Dak Nong", Coordinates::new(12.0086, 107.6903)),
    ("Binh Duong", Coordinates::new(10.9719, 106.6661)),
    ("Binh Phuoc", Coordinates::new(11.7512, 106.7230)),
    ("Dong Nai", Coordinates::new(10.9453, 106.8240)),
    ("Ba Ria Vung Tau", Coordinates::new(10.4114, 107.1362)),
    ("Tay Ninh", Coordinates::new(11.3227, 106.1473)),
    ("Long An", Coordinates::new(10.5960, 106.3683)),
    ("Tien Giang", Coordinates::new(10.3934, 106.3439)),
    ("Ben Tre", Coordinates::new(10.2360, 106.3740)),
    ("Tra Vinh", Coordinates::new(9.9477, 106.3420)),
    ("Vinh Long", Coordinates::new(10.2443, 105.9646)),
    ("Dong Thap", Coordinates::new(10.4574, 105.6325)),
    ("An Giang", Coordinates::new(10.5020, 105.1259)),
    ("Can Tho", Coordinates::new(10.0452, 105.7469)),
    ("Hau Giang", Coordinates::new(9.7846, 105.4700)),
    ("Soc Trang", Coordinates::new(9.6030, 105.9800)),
    ("Bac Lieu", Coordinates::new(9.2940, 105.7217)),
    ("Ca Mau", Coordinates::new(9.1766, 105.1500)),
    ("Ha Nam", Coordinates::new(20.5410, 105.9220)),
    ("Hoa Binh", Coordinates::new(20.8172, 105.3380)),
    ("Son La", Coordinates::new(21.3280, 103.9140)),
    ("Dien Bien", Coordinates::new(21.3860, 103.0190)),
];

pub fn province_centroid(province_id: &str) -> Option<Coordinates> {
    PROVINCE_CENTROIDS
        .iter()
        .find(|(id, _)| *id == province_id)
        .map(|(_, coords)| *coords)
}
