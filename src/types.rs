//! CPU record types and the detail label table

/// Column headers of the CSV store, in serialization order
pub const CSV_HEADERS: [&str; 27] = [
    "Name",
    "Image URL",
    "Product URL",
    "Price",
    "Manufacturer",
    "Part #",
    "Series",
    "Microarchitecture",
    "Core Family",
    "Socket",
    "Core Count",
    "Performance Core Clock",
    "Performance Core Boost Clock",
    "Efficiency Core Clock",
    "Efficiency Core Boost Clock",
    "L2 Cache",
    "L3 Cache",
    "TDP",
    "Integrated Graphics",
    "Maximum Supported Memory",
    "ECC Support",
    "Includes Cooler",
    "Packaging",
    "Lithography",
    "Includes CPU Cooler",
    "Simultaneous Multithreading",
    "Specs Num",
];

/// A recognized spec on the product detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    Manufacturer,
    PartNumber,
    Series,
    Microarchitecture,
    CoreFamily,
    Socket,
    CoreCount,
    PerformanceCoreClock,
    PerformanceCoreBoostClock,
    EfficiencyCoreClock,
    EfficiencyCoreBoostClock,
    L2Cache,
    L3Cache,
    Tdp,
    IntegratedGraphics,
    MaximumSupportedMemory,
    EccSupport,
    IncludesCooler,
    Packaging,
    Lithography,
    IncludesCpuCooler,
    SimultaneousMultithreading,
}

/// Spec group headings mapped to the field they fill, in column order.
/// Headings not listed here are ignored.
pub const DETAIL_LABELS: [(&str, DetailField); 22] = [
    ("Manufacturer", DetailField::Manufacturer),
    ("Part #", DetailField::PartNumber),
    ("Series", DetailField::Series),
    ("Microarchitecture", DetailField::Microarchitecture),
    ("Core Family", DetailField::CoreFamily),
    ("Socket", DetailField::Socket),
    ("Core Count", DetailField::CoreCount),
    ("Performance Core Clock", DetailField::PerformanceCoreClock),
    ("Performance Core Boost Clock", DetailField::PerformanceCoreBoostClock),
    ("Efficiency Core Clock", DetailField::EfficiencyCoreClock),
    ("Efficiency Core Boost Clock", DetailField::EfficiencyCoreBoostClock),
    ("L2 Cache", DetailField::L2Cache),
    ("L3 Cache", DetailField::L3Cache),
    ("TDP", DetailField::Tdp),
    ("Integrated Graphics", DetailField::IntegratedGraphics),
    ("Maximum Supported Memory", DetailField::MaximumSupportedMemory),
    ("ECC Support", DetailField::EccSupport),
    ("Includes Cooler", DetailField::IncludesCooler),
    ("Packaging", DetailField::Packaging),
    ("Lithography", DetailField::Lithography),
    ("Includes CPU Cooler", DetailField::IncludesCpuCooler),
    ("Simultaneous Multithreading", DetailField::SimultaneousMultithreading),
];

impl DetailField {
    /// Exact-match lookup of a spec group heading
    pub fn from_label(label: &str) -> Option<Self> {
        DETAIL_LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, field)| *field)
    }
}

/// Spec values scraped from a detail page. Every field is always present;
/// specs that were not on the page stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuDetails {
    pub manufacturer: String,
    pub part_number: String,
    pub series: String,
    pub microarchitecture: String,
    pub core_family: String,
    pub socket: String,
    pub core_count: String,
    pub performance_core_clock: String,
    pub performance_core_boost_clock: String,
    pub efficiency_core_clock: String,
    pub efficiency_core_boost_clock: String,
    pub l2_cache: String,
    pub l3_cache: String,
    pub tdp: String,
    pub integrated_graphics: String,
    pub maximum_supported_memory: String,
    pub ecc_support: String,
    pub includes_cooler: String,
    pub packaging: String,
    pub lithography: String,
    pub includes_cpu_cooler: String,
    pub simultaneous_multithreading: String,
    /// Number of spec groups on the page, recognized or not
    pub specs_num: usize,
}

impl CpuDetails {
    pub fn get(&self, field: DetailField) -> &str {
        match field {
            DetailField::Manufacturer => &self.manufacturer,
            DetailField::PartNumber => &self.part_number,
            DetailField::Series => &self.series,
            DetailField::Microarchitecture => &self.microarchitecture,
            DetailField::CoreFamily => &self.core_family,
            DetailField::Socket => &self.socket,
            DetailField::CoreCount => &self.core_count,
            DetailField::PerformanceCoreClock => &self.performance_core_clock,
            DetailField::PerformanceCoreBoostClock => &self.performance_core_boost_clock,
            DetailField::EfficiencyCoreClock => &self.efficiency_core_clock,
            DetailField::EfficiencyCoreBoostClock => &self.efficiency_core_boost_clock,
            DetailField::L2Cache => &self.l2_cache,
            DetailField::L3Cache => &self.l3_cache,
            DetailField::Tdp => &self.tdp,
            DetailField::IntegratedGraphics => &self.integrated_graphics,
            DetailField::MaximumSupportedMemory => &self.maximum_supported_memory,
            DetailField::EccSupport => &self.ecc_support,
            DetailField::IncludesCooler => &self.includes_cooler,
            DetailField::Packaging => &self.packaging,
            DetailField::Lithography => &self.lithography,
            DetailField::IncludesCpuCooler => &self.includes_cpu_cooler,
            DetailField::SimultaneousMultithreading => &self.simultaneous_multithreading,
        }
    }

    pub fn set(&mut self, field: DetailField, value: String) {
        let slot = match field {
            DetailField::Manufacturer => &mut self.manufacturer,
            DetailField::PartNumber => &mut self.part_number,
            DetailField::Series => &mut self.series,
            DetailField::Microarchitecture => &mut self.microarchitecture,
            DetailField::CoreFamily => &mut self.core_family,
            DetailField::Socket => &mut self.socket,
            DetailField::CoreCount => &mut self.core_count,
            DetailField::PerformanceCoreClock => &mut self.performance_core_clock,
            DetailField::PerformanceCoreBoostClock => &mut self.performance_core_boost_clock,
            DetailField::EfficiencyCoreClock => &mut self.efficiency_core_clock,
            DetailField::EfficiencyCoreBoostClock => &mut self.efficiency_core_boost_clock,
            DetailField::L2Cache => &mut self.l2_cache,
            DetailField::L3Cache => &mut self.l3_cache,
            DetailField::Tdp => &mut self.tdp,
            DetailField::IntegratedGraphics => &mut self.integrated_graphics,
            DetailField::MaximumSupportedMemory => &mut self.maximum_supported_memory,
            DetailField::EccSupport => &mut self.ecc_support,
            DetailField::IncludesCooler => &mut self.includes_cooler,
            DetailField::Packaging => &mut self.packaging,
            DetailField::Lithography => &mut self.lithography,
            DetailField::IncludesCpuCooler => &mut self.includes_cpu_cooler,
            DetailField::SimultaneousMultithreading => &mut self.simultaneous_multithreading,
        };
        *slot = value;
    }

    /// True when no spec was recognized and no group was counted
    pub fn is_empty(&self) -> bool {
        self.specs_num == 0 && DETAIL_LABELS.iter().all(|(_, f)| self.get(*f).is_empty())
    }
}

/// Complete CPU row: listing summary plus detail specs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuRecord {
    pub name: String,
    pub image_url: String,
    pub product_url: String,
    pub price: String,
    pub details: CpuDetails,
}

impl CpuRecord {
    /// Field values in `CSV_HEADERS` order. A zero spec count is written blank.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(CSV_HEADERS.len());
        row.push(self.name.clone());
        row.push(self.image_url.clone());
        row.push(self.product_url.clone());
        row.push(self.price.clone());
        for (_, field) in &DETAIL_LABELS {
            row.push(self.details.get(*field).to_string());
        }
        row.push(match self.details.specs_num {
            0 => String::new(),
            n => n.to_string(),
        });
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_header_order() {
        let labels: Vec<&str> = DETAIL_LABELS.iter().map(|(label, _)| *label).collect();
        assert_eq!(&CSV_HEADERS[4..26], labels.as_slice());
    }

    #[test]
    fn test_from_label_is_exact() {
        assert_eq!(DetailField::from_label("Core Count"), Some(DetailField::CoreCount));
        assert_eq!(DetailField::from_label("TDP"), Some(DetailField::Tdp));
        assert_eq!(DetailField::from_label("core count"), None);
        assert_eq!(DetailField::from_label(" Core Count"), None);
        assert_eq!(DetailField::from_label("Color"), None);
    }

    #[test]
    fn test_set_and_get_round_through_every_field() {
        let mut details = CpuDetails::default();
        for (label, field) in &DETAIL_LABELS {
            details.set(*field, format!("value for {}", label));
        }
        for (label, field) in &DETAIL_LABELS {
            assert_eq!(details.get(*field), format!("value for {}", label));
        }
        assert!(!details.is_empty());
    }

    #[test]
    fn test_row_always_has_every_column() {
        let record = CpuRecord {
            name: "AMD Ryzen 7 7800X3D".to_string(),
            image_url: String::new(),
            product_url: String::new(),
            price: "N/A".to_string(),
            details: CpuDetails::default(),
        };
        let row = record.to_row();
        assert_eq!(row.len(), CSV_HEADERS.len());
        assert_eq!(row[0], "AMD Ryzen 7 7800X3D");
        assert_eq!(row[3], "N/A");
        assert!(row[4..].iter().all(|v| v.is_empty()));
    }

    #[test]
    fn test_row_writes_spec_count_last() {
        let mut details = CpuDetails::default();
        details.socket = "AM5".to_string();
        details.specs_num = 21;
        let record = CpuRecord {
            name: "AMD Ryzen 9 7950X".to_string(),
            image_url: "https://cdna.pcpartpicker.com/7950x.jpg".to_string(),
            product_url: "https://pcpartpicker.com/product/22XJ7P".to_string(),
            price: "$529.99".to_string(),
            details,
        };
        let row = record.to_row();
        assert_eq!(row[9], "AM5");
        assert_eq!(row[26], "21");
    }
}
