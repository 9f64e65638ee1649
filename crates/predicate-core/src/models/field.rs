use serde::{Deserialize, Serialize};

/// Descriptive fields of a [`DeviceRecord`](super::DeviceRecord) that take part in merging.
///
/// Identity fields (`id`, `device_name`, `clearance_key`) are not listed here; they
/// belong to the record a match was found against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceField {
    Manufacturer,
    RegulationNumber,
    ClearanceDate,
    IntendedUse,
    Technology,
    PerformanceSummary,
    ProductCode,
    DeviceClass,
    DeviceDescription,
}

impl DeviceField {
    pub const ALL: [DeviceField; 9] = [
        DeviceField::Manufacturer,
        DeviceField::RegulationNumber,
        DeviceField::ClearanceDate,
        DeviceField::IntendedUse,
        DeviceField::Technology,
        DeviceField::PerformanceSummary,
        DeviceField::ProductCode,
        DeviceField::DeviceClass,
        DeviceField::DeviceDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufacturer => "manufacturer",
            Self::RegulationNumber => "regulation_number",
            Self::ClearanceDate => "clearance_date",
            Self::IntendedUse => "intended_use",
            Self::Technology => "technology",
            Self::PerformanceSummary => "performance_summary",
            Self::ProductCode => "product_code",
            Self::DeviceClass => "device_class",
            Self::DeviceDescription => "device_description",
        }
    }
}

impl std::fmt::Display for DeviceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
