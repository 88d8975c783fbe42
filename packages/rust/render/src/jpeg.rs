//! Minimal JPEG header probe for embedding logos.

/// Dimensions and channel count read from a JPEG frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

/// Read the first start-of-frame segment. `None` if `bytes` is not a JPEG
/// or the header is truncated.
pub(crate) fn probe_jpeg(bytes: &[u8]) -> Option<JpegInfo> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            // fill byte
            0xFF => {
                pos += 1;
                continue;
            }
            // standalone markers
            0x01 | 0xD0..=0xD8 => {
                pos += 2;
                continue;
            }
            // scan data or end of image before any frame header
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let len = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        if len < 2 {
            return None;
        }

        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let segment = bytes.get(pos + 4..pos + 2 + len)?;
            if segment.len() < 6 {
                return None;
            }
            let height = u32::from(u16::from_be_bytes([segment[1], segment[2]]));
            let width = u32::from(u16::from_be_bytes([segment[3], segment[4]]));
            let components = segment[5];
            if width == 0 || height == 0 {
                return None;
            }
            return Some(JpegInfo {
                width,
                height,
                components,
            });
        }

        pos += 2 + len;
    }

    None
}

/// A 64x32 RGB JPEG header (no scan data) for tests.
#[cfg(test)]
pub(crate) fn tiny_jpeg() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    // APP0 / JFIF
    bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    bytes.extend_from_slice(b"JFIF\0");
    bytes.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    // SOF0: precision 8, height 32, width 64, 3 components
    bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x20, 0x00, 0x40, 0x03]);
    bytes.extend_from_slice(&[0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_frame_header() {
        let info = probe_jpeg(&tiny_jpeg()).unwrap();
        assert_eq!(
            info,
            JpegInfo {
                width: 64,
                height: 32,
                components: 3
            }
        );
    }

    #[test]
    fn rejects_non_jpeg() {
        assert!(probe_jpeg(b"\x89PNG\r\n\x1a\n").is_none());
        assert!(probe_jpeg(&[]).is_none());
    }

    #[test]
    fn rejects_truncated_header() {
        let mut bytes = tiny_jpeg();
        bytes.truncate(24);
        assert!(probe_jpeg(&bytes).is_none());
    }
}
