//! Human-readable byte formatting.

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;
const PB: f64 = TB * 1024.0;
const EB: f64 = PB * 1024.0;

/// Format a byte count on a fixed unit ladder (B through EB, powers of
/// 1024). Plain bytes print without decimals, everything above with two.
pub fn pretty_bytes(size: u64) -> String {
    let size = size as f64;
    let (unit_size, unit) = if size >= EB {
        (EB, "EB")
    } else if size >= PB {
        (PB, "PB")
    } else if size >= TB {
        (TB, "TB")
    } else if size >= GB {
        (GB, "GB")
    } else if size >= MB {
        (MB, "MB")
    } else if size >= KB {
        (KB, "KB")
    } else {
        return format!("{size:.0} B");
    };
    format!("{:.2} {unit}", size / unit_size)
}
