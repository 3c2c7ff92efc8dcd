//! Fixed MPEG Audio bitrate and sample-rate tables (ISO/IEC 11172-3, 13818-3).

use crate::frame::{Layer, MpegVersion};

/// `None` marks a reserved/free/bad index; callers treat that as a bad header.
pub fn bitrate_kbps(version: MpegVersion, layer: Layer, index: u8) -> Option<u32> {
    if index == 0 || index == 15 {
        return None;
    }
    let i = index as usize - 1;
    let table: &[u32; 14] = match (version, layer) {
        (MpegVersion::V1, Layer::L1) => {
            &[32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448]
        }
        (MpegVersion::V1, Layer::L2) => {
            &[32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384]
        }
        (MpegVersion::V1, Layer::L3) => {
            &[32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320]
        }
        (MpegVersion::V2 | MpegVersion::V25, Layer::L1) => {
            &[32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256]
        }
        (MpegVersion::V2 | MpegVersion::V25, Layer::L2 | Layer::L3) => {
            &[8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160]
        }
    };
    Some(table[i])
}

/// `None` marks the reserved index (3).
pub fn sample_rate_hz(version: MpegVersion, index: u8) -> Option<u32> {
    let table: [u32; 3] = match version {
        MpegVersion::V1 => [44_100, 48_000, 32_000],
        MpegVersion::V2 => [22_050, 24_000, 16_000],
        MpegVersion::V25 => [11_025, 12_000, 8_000],
    };
    table.get(index as usize).copied()
}

/// Samples per frame, fixed per version/layer combination.
pub fn samples_per_frame(version: MpegVersion, layer: Layer) -> u32 {
    match layer {
        Layer::L1 => 384,
        Layer::L2 => 1152,
        Layer::L3 => match version {
            MpegVersion::V1 => 1152,
            MpegVersion::V2 | MpegVersion::V25 => 576,
        },
    }
}
