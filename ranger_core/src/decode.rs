//! Raw event-line decoding.
//!
//! The event stream is mostly noise: sync reports, other axes, occasional
//! garbage. A line is relevant only when it carries the configured axis
//! marker; everything else is skipped without comment. Malformed relevant
//! lines (short token count, bad hex) are dropped the same way so isolated
//! garbage never halts the stream.

/// One decoded distance/status pair, consumed immediately by the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSample {
    /// Distance in millimeters (upper 16 bits of the packed value).
    pub distance_mm: u16,
    /// Raw status code (lower 16 bits). Opaque to the core.
    pub status: u16,
}

/// Extracts packed samples from raw event lines.
#[derive(Debug, Clone)]
pub struct LineDecoder {
    marker: String,
}

impl LineDecoder {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Decode one line. `None` means "nothing to report" — an irrelevant or
    /// malformed line, never an error.
    ///
    /// A relevant line must split into at least three whitespace-separated
    /// tokens; the final token is the packed hex value.
    pub fn decode(&self, line: &str) -> Option<DecodedSample> {
        if !line.contains(self.marker.as_str()) {
            return None;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            return None;
        }
        let raw = match u32::from_str_radix(tokens[tokens.len() - 1], 16) {
            Ok(v) => v,
            Err(_) => {
                tracing::trace!(line, "dropping unparseable sample line");
                return None;
            }
        };
        Some(DecodedSample {
            distance_mm: (raw >> 16) as u16,
            status: (raw & 0xFFFF) as u16,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decoder() -> LineDecoder {
        LineDecoder::new("ABS_HAT1X")
    }

    #[rstest]
    #[case(0x0064_0001, 100, 1)]
    #[case(0x0092_0002, 146, 2)]
    #[case(0x0000_0000, 0, 0)]
    #[case(0xFFFF_FFFF, 0xFFFF, 0xFFFF)]
    #[case(0x0001_FFFE, 1, 0xFFFE)]
    fn splits_packed_value(#[case] raw: u32, #[case] mm: u16, #[case] status: u16) {
        let line = format!("EV_ABS       ABS_HAT1X            {raw:08x}");
        assert_eq!(
            decoder().decode(&line),
            Some(DecodedSample {
                distance_mm: mm,
                status
            })
        );
    }

    #[test]
    fn surrounding_whitespace_is_irrelevant() {
        for line in [
            "EV_ABS ABS_HAT1X 00640001",
            "  EV_ABS   ABS_HAT1X   00640001  ",
            "\tEV_ABS\tABS_HAT1X\t00640001\t",
        ] {
            assert_eq!(
                decoder().decode(line),
                Some(DecodedSample {
                    distance_mm: 100,
                    status: 1
                })
            );
        }
    }

    #[test]
    fn unrelated_lines_are_skipped() {
        assert_eq!(decoder().decode("EV_SYN       SYN_REPORT           00000000"), None);
        assert_eq!(decoder().decode("EV_ABS       ABS_HAT0Y            00640001"), None);
        assert_eq!(decoder().decode(""), None);
    }

    #[test]
    fn short_token_count_is_dropped() {
        // The marker alone, or marker + value, is not a full event record.
        assert_eq!(decoder().decode("ABS_HAT1X"), None);
        assert_eq!(decoder().decode("ABS_HAT1X 00640001"), None);
    }

    #[test]
    fn malformed_hex_is_dropped() {
        assert_eq!(decoder().decode("EV_ABS ABS_HAT1X zzzzzzzz"), None);
        assert_eq!(decoder().decode("EV_ABS ABS_HAT1X 0x640001"), None);
        // more than 8 hex digits overflows u32
        assert_eq!(decoder().decode("EV_ABS ABS_HAT1X 100000000"), None);
        assert_eq!(decoder().decode("EV_ABS ABS_HAT1X -0640001"), None);
    }

    #[test]
    fn custom_marker_is_honored() {
        let dec = LineDecoder::new("ABS_HAT2X");
        assert!(dec.decode("EV_ABS ABS_HAT2X 00640001").is_some());
        assert!(dec.decode("EV_ABS ABS_HAT1X 00640001").is_none());
    }
}
