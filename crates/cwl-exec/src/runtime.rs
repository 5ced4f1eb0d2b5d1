//! The `runtime.*` record exposed to expressions and used to size
//! `ResourceRequirement` bounds (§4.4 "Host introspection", §4.6 "Runtime
//! derivation").

use crate::error::InspectionError;
use commonwl::requirements::{Requirement, ResourceRequirement};
use std::collections::HashMap;
use std::path::PathBuf;

/// Defaults CWL specifies when a bound is absent: 1 GiB RAM, 1 GiB each for
/// tmpdir/outdir. There is no default-cores constant: absent any bound,
/// `cores` is the host's own core count.
const DEFAULT_RAM_MIB: u64 = 1024;
const DEFAULT_TMPDIR_MIB: u64 = 1024;
const DEFAULT_OUTDIR_MIB: u64 = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Runtime {
    pub outdir: PathBuf,
    pub tmpdir: PathBuf,
    pub cores: u64,
    pub ram_mib: u64,
    pub tmpdir_size_mib: u64,
    pub outdir_size_mib: u64,
}

impl Runtime {
    /// Builds the `runtime` record a tool would see, deriving cores/RAM from
    /// its `ResourceRequirement` (requirement takes precedence over hint)
    /// bounded by what the host actually reports.
    ///
    /// `cores = min(host_nprocs, coresMax ?? coresMin ?? host_nprocs)`, and
    /// fails if the host reports fewer cores than `coresMin` demands.  `ram`
    /// defaults to 1024 MiB, is capped by `ramMax`, and fails if `ramMax`
    /// would drop it below `ramMin`.  `coresMax < coresMin` and
    /// `ramMax < ramMin` are themselves configuration errors.
    pub fn derive(requirements: &[Requirement], hints: &[Requirement], outdir: PathBuf, tmpdir: PathBuf) -> Result<Self, InspectionError> {
        let resource_req: Option<&ResourceRequirement> = Requirement::get(requirements).or_else(|| Requirement::get(hints));

        let host_cores = std::thread::available_parallelism().map(|n| n.get() as u64).unwrap_or(1);

        let cores_min = resource_req.and_then(|r| r.cores_min.as_ref()).and_then(|v| v.as_f64()).map(|v| v as u64);
        let cores_max = resource_req.and_then(|r| r.cores_max.as_ref()).and_then(|v| v.as_f64()).map(|v| v as u64);
        let ram_min = resource_req.and_then(|r| r.ram_min.as_ref()).and_then(|v| v.as_f64()).map(|v| v as u64);
        let ram_max = resource_req.and_then(|r| r.ram_max.as_ref()).and_then(|v| v.as_f64()).map(|v| v as u64);

        if let (Some(min), Some(max)) = (cores_min, cores_max) {
            if max < min {
                return Err(InspectionError::ResourceRequirement { reason: format!("coresMax ({max}) is less than coresMin ({min})") });
            }
        }
        if let (Some(min), Some(max)) = (ram_min, ram_max) {
            if max < min {
                return Err(InspectionError::ResourceRequirement { reason: format!("ramMax ({max}) is less than ramMin ({min})") });
            }
        }

        if let Some(min) = cores_min {
            if host_cores < min {
                return Err(InspectionError::ResourceRequirement { reason: format!("host has {host_cores} cores, fewer than coresMin ({min})") });
            }
        }
        let cores = host_cores.min(cores_max.or(cores_min).unwrap_or(host_cores));

        let mut ram_mib = DEFAULT_RAM_MIB;
        if let Some(max) = ram_max {
            ram_mib = ram_mib.min(max);
        }
        if let Some(min) = ram_min {
            if ram_mib < min {
                return Err(InspectionError::ResourceRequirement { reason: format!("ram ({ram_mib} MiB) is below ramMin ({min} MiB)") });
            }
        }

        let tmpdir_size_mib = resource_req.and_then(|r| r.tmpdir_min.as_ref()).and_then(|v| v.as_f64()).map(|v| v as u64).unwrap_or(DEFAULT_TMPDIR_MIB);

        let outdir_size_mib = resource_req.and_then(|r| r.outdir_min.as_ref()).and_then(|v| v.as_f64()).map(|v| v as u64).unwrap_or(DEFAULT_OUTDIR_MIB);

        Ok(Runtime { outdir, tmpdir, cores, ram_mib, tmpdir_size_mib, outdir_size_mib })
    }

    /// Renders as the string-keyed map expressions see via `runtime.*`.
    pub fn as_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("outdir".to_string(), self.outdir.to_string_lossy().into_owned()),
            ("tmpdir".to_string(), self.tmpdir.to_string_lossy().into_owned()),
            ("cores".to_string(), self.cores.to_string()),
            ("ram".to_string(), self.ram_mib.to_string()),
            ("tmpdirSize".to_string(), self.tmpdir_size_mib.to_string()),
            ("outdirSize".to_string(), self.outdir_size_mib.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_defaults_without_resource_requirement() {
        let runtime = Runtime::derive(&[], &[], PathBuf::from("/out"), PathBuf::from("/tmp")).unwrap();
        assert_eq!(runtime.ram_mib, DEFAULT_RAM_MIB);
        let host_cores = std::thread::available_parallelism().map(|n| n.get() as u64).unwrap_or(1);
        assert_eq!(runtime.cores, host_cores);
    }

    #[test]
    fn test_derive_fails_when_ram_min_exceeds_default() {
        let req = Requirement::ResourceRequirement(ResourceRequirement {
            ram_min: Some(commonwl::requirements::StringOrNumber::Int(1024 * 1024)),
            ..Default::default()
        });
        let result = Runtime::derive(&[req], &[], PathBuf::from("/out"), PathBuf::from("/tmp"));
        assert!(result.is_err());
    }

    #[test]
    fn test_derive_caps_ram_by_ram_max() {
        let req = Requirement::ResourceRequirement(ResourceRequirement {
            ram_max: Some(commonwl::requirements::StringOrNumber::Int(512)),
            ..Default::default()
        });
        let runtime = Runtime::derive(&[req], &[], PathBuf::from("/out"), PathBuf::from("/tmp")).unwrap();
        assert_eq!(runtime.ram_mib, 512);
    }

    #[test]
    fn test_derive_fails_when_cores_max_below_cores_min() {
        let req = Requirement::ResourceRequirement(ResourceRequirement {
            cores_min: Some(commonwl::requirements::StringOrNumber::Int(4)),
            cores_max: Some(commonwl::requirements::StringOrNumber::Int(2)),
            ..Default::default()
        });
        let result = Runtime::derive(&[req], &[], PathBuf::from("/out"), PathBuf::from("/tmp"));
        assert!(result.is_err());
    }

    #[test]
    fn test_derive_cores_defaults_to_host_when_unbounded() {
        let runtime = Runtime::derive(&[], &[], PathBuf::from("/out"), PathBuf::from("/tmp")).unwrap();
        let host_cores = std::thread::available_parallelism().map(|n| n.get() as u64).unwrap_or(1);
        assert_eq!(runtime.cores, host_cores);
    }

    #[test]
    fn test_as_map_has_expected_keys() {
        let runtime = Runtime::derive(&[], &[], PathBuf::from("/out"), PathBuf::from("/tmp")).unwrap();
        let map = runtime.as_map();
        assert_eq!(map.get("outdir").unwrap(), "/out");
        assert!(map.contains_key("cores"));
    }
}
