pub mod names;
pub mod profile;
pub mod storage;
pub mod types;

pub use names::{
    NameError, disk_volume_name, expand_name_format, format_node_list, instance_name_from_host_name,
    validate_instance_name,
};
pub use profile::{DiskRequirement, HardwareProfile, SoftwareProfile};
pub use storage::{DEFAULT_STORAGE_ADAPTER, DiskChanges, StorageDisk};
pub use types::*;
