use std::path::Path;

use sysinfo::{DiskExt, System, SystemExt};

/// Returns the free space of the disk holding `path`, in bytes.
///
/// Best effort only: callers ignore a `None` and keep the last value they
/// had. The deepest matching mount point wins.
pub fn get_free_space(path: &Path) -> Option<u64> {
    let sys = System::new_all();

    let mut best: Option<(usize, u64)> = None;
    for disk in sys.disks() {
        if path.starts_with(disk.mount_point()) {
            let depth = disk.mount_point().components().count();
            if best.map_or(true, |(d, _)| depth >= d) {
                best = Some((depth, disk.available_space()));
            }
        }
    }

    best.map(|(_, space)| space)
}

pub fn format_free_space(bytes: u64) -> String {
    let mib = bytes as f64 / 1_048_576.0;
    if mib >= 1_048_576.0 {
        format!("{:.2} TB", mib / 1_048_576.0)
    } else if mib >= 1_024.0 {
        format!("{:.2} GB", mib / 1_024.0)
    } else {
        format!("{:.2} MB", mib)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_space_formats_by_magnitude() {
        assert_eq!(format_free_space(10 * 1_048_576), "10.00 MB");
        assert_eq!(format_free_space(2 * 1024 * 1_048_576), "2.00 GB");
    }
}
