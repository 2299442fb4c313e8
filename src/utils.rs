use crate::fs::RAW_BLOCK_SIZE;

/// Converts a count of 512-byte units into `block_size` units, rounding up.
pub fn scale_blocks(raw_blocks: u64, block_size: u64) -> u64 {
    if block_size == RAW_BLOCK_SIZE {
        return raw_blocks;
    }
    let bytes = u128::from(raw_blocks) * u128::from(RAW_BLOCK_SIZE);
    let scaled = bytes.div_ceil(u128::from(block_size.max(1)));
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

pub fn format_human_elapsed(elapsed: std::time::Duration) -> String {
    let elapsed_secs = elapsed.as_secs();
    let elapsed_subsec_millis = elapsed.subsec_millis();
    if elapsed_secs >= 3600 {
        let hours = elapsed_secs / 3600;
        let minutes = (elapsed_secs % 3600) / 60;
        let seconds = elapsed_secs % 60;
        format!("{hours}:{minutes:02}:{seconds:02}.{elapsed_subsec_millis:03} (h:mm:ss.mmm)")
    } else if elapsed_secs >= 60 {
        let minutes = elapsed_secs / 60;
        let seconds = elapsed_secs % 60;
        format!("{minutes}:{seconds:02}.{elapsed_subsec_millis:03} (m:ss.mmm)")
    } else {
        format!("{}.{:03} seconds", elapsed_secs, elapsed_subsec_millis)
    }
}
