//! Startup check that the GPU supports what the chunk renderer needs

use std::fmt::Write;

use crate::core::error::Error;
use crate::core::types::Result;

/// Device features the chunk passes rely on
pub const REQUIRED_FEATURES: &[(&str, wgpu::Features)] = &[
    ("DEPTH_CLIP_CONTROL", wgpu::Features::DEPTH_CLIP_CONTROL),
    ("INDIRECT_FIRST_INSTANCE", wgpu::Features::INDIRECT_FIRST_INSTANCE),
];

/// Features reported for diagnostics but not required
pub const OPTIONAL_FEATURES: &[(&str, wgpu::Features)] = &[
    ("TIMESTAMP_QUERY", wgpu::Features::TIMESTAMP_QUERY),
    ("TEXTURE_COMPRESSION_BC", wgpu::Features::TEXTURE_COMPRESSION_BC),
    ("SHADER_F16", wgpu::Features::SHADER_F16),
];

/// Identification strings of the adapter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GpuInfo {
    pub vendor: String,
    pub model: String,
    pub driver: String,
}

impl GpuInfo {
    pub fn new(vendor: impl Into<String>, model: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            driver: driver.into(),
        }
    }
}

/// Fail with a user-facing report when any of `required` is not in
/// `supported`
pub fn check_capabilities(required: &[&str], supported: &[&str], gpu: &GpuInfo) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !supported.contains(name))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    for name in &missing {
        log::error!("Missing GPU capability: {}", name);
    }
    Err(Error::MissingCapabilities(missing_capabilities_message(&missing, gpu)))
}

fn missing_capabilities_message(missing: &[&str], gpu: &GpuInfo) -> String {
    let mut message = String::from(
        "\n\nThe following GPU features are required but are not supported by your GPU driver:\n\n",
    );
    for name in missing {
        let _ = writeln!(message, "    - {name}");
    }
    let _ = write!(
        message,
        "\nGPU Information:\n\n    Vendor:  {}\n    Model:   {}\n    Driver:  {}\n\n",
        gpu.vendor, gpu.model, gpu.driver
    );
    message.push_str("Try updating the driver to the latest version available.\n");
    message.push_str("If that fails you might need to use a different GPU (graphics card). Sorry!\n");
    message
}

/// Adapter identification and the names of the known features it supports
pub fn from_wgpu(info: &wgpu::AdapterInfo, features: wgpu::Features) -> (GpuInfo, Vec<&'static str>) {
    let gpu = gpu_info(&info.name, info.vendor, &info.driver, &info.driver_info);
    (gpu, supported_features(features))
}

/// Readable identification from raw adapter fields. The driver string joins
/// the driver name with its version info when the backend reports one.
pub fn gpu_info(name: &str, vendor: u32, driver: &str, driver_info: &str) -> GpuInfo {
    let driver = if driver_info.is_empty() {
        driver.to_string()
    } else {
        format!("{driver} {driver_info}")
    };
    GpuInfo::new(vendor_name(vendor), name, driver)
}

/// Names of the required and optional features present in `features`
pub fn supported_features(features: wgpu::Features) -> Vec<&'static str> {
    REQUIRED_FEATURES
        .iter()
        .chain(OPTIONAL_FEATURES)
        .filter(|(_, flag)| features.contains(*flag))
        .map(|(name, _)| *name)
        .collect()
}

/// Check an adapter against [`REQUIRED_FEATURES`]
pub fn check_adapter(info: &wgpu::AdapterInfo, features: wgpu::Features) -> Result<()> {
    let (gpu, _) = from_wgpu(info, features);
    check_features(&gpu, features)
}

/// Check a device's feature set against [`REQUIRED_FEATURES`]
pub fn check_features(gpu: &GpuInfo, features: wgpu::Features) -> Result<()> {
    log::info!("GPU: {} ({}), driver {}", gpu.model, gpu.vendor, gpu.driver);
    let required: Vec<&str> = REQUIRED_FEATURES.iter().map(|(name, _)| *name).collect();
    check_capabilities(&required, &supported_features(features), gpu)
}

/// PCI vendor id to a readable name
fn vendor_name(vendor: u32) -> String {
    match vendor {
        0x10de => "NVIDIA".to_string(),
        0x1002 | 0x1022 => "AMD".to_string(),
        0x8086 => "Intel".to_string(),
        0x106b => "Apple".to_string(),
        0x13b5 => "ARM".to_string(),
        0x5143 => "Qualcomm".to_string(),
        0 => "Unknown".to_string(),
        other => format!("0x{other:04x}"),
    }
}
