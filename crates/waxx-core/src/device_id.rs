//! Device identifier resolution from scanned NFC tags.
//!
//! Tags carry the identifier either as written NDEF data or, failing that,
//! only as the tag's serial number.

use tracing::debug;

/// Length of a hex device ID embedded in a URL record.
const EMBEDDED_ID_LEN: usize = 16;

/// NDEF record types as reported by the NFC reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    Text,
    Url,
    Mime,
    Unknown,
    Other(String),
}

impl From<&str> for RecordType {
    fn from(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "url" => Self::Url,
            "mime" => Self::Mime,
            "unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One record of a scanned NDEF message.
#[derive(Debug, Clone)]
pub struct NdefRecord {
    pub record_type: RecordType,
    pub data: Vec<u8>,
}

impl NdefRecord {
    pub fn new(record_type: impl Into<RecordType>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            record_type: record_type.into(),
            data: data.into(),
        }
    }

    /// Extract a device ID from this record, if it holds one.
    pub fn device_id(&self) -> Option<String> {
        match &self.record_type {
            RecordType::Text => decode_text_record(&self.data),
            RecordType::Url => {
                let url = std::str::from_utf8(&self.data).ok()?;
                Some(find_embedded_id(url).unwrap_or_else(|| url.to_string()))
            }
            RecordType::Mime | RecordType::Unknown => {
                let text = std::str::from_utf8(&self.data).ok()?.trim();
                if is_hex(text) {
                    Some(text.to_ascii_uppercase())
                } else {
                    Some(text.to_string())
                }
            }
            RecordType::Other(_) => None,
        }
    }
}

/// Text record payload: status byte, language code, then UTF-8 text.
/// The low six bits of the status byte give the language code length.
fn decode_text_record(payload: &[u8]) -> Option<String> {
    let (&status, rest) = payload.split_first()?;
    let lang_len = usize::from(status & 0x3f);
    let text = rest.get(lang_len..)?;
    std::str::from_utf8(text).ok().map(str::to_string)
}

fn find_embedded_id(url: &str) -> Option<String> {
    url.as_bytes()
        .windows(EMBEDDED_ID_LEN)
        .find(|w| w.iter().all(u8::is_ascii_hexdigit))
        .map(|w| String::from_utf8_lossy(w).to_ascii_uppercase())
}

fn is_hex(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Whether `input` looks like a separated tag serial (`04:a1:b2`, `04-A1-B2`):
/// hex digit groups joined by `:` or `-`.
pub fn is_separated_serial(input: &str) -> bool {
    let separated = input.contains(':') || input.contains('-');
    separated
        && input
            .split(|c| c == ':' || c == '-')
            .all(is_hex)
}

/// Normalize a tag serial number (`04:a1:b2...`) into a device ID.
pub fn normalize_serial(serial: &str) -> String {
    serial
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Resolve the device ID for a scanned tag.
///
/// The first record that decodes is authoritative. If it decodes to blank
/// text, or no record decodes, the serial number is used; an empty serial
/// means the tag carries no ID.
pub fn resolve_device_id(records: &[NdefRecord], serial_number: Option<&str>) -> Option<String> {
    let written = records.iter().find_map(|record| {
        let id = record.device_id();
        if id.is_none() {
            debug!(record_type = ?record.record_type, "Record did not yield a device ID");
        }
        id
    });

    if let Some(id) = written.filter(|id| !id.trim().is_empty()) {
        return Some(id);
    }

    serial_number
        .filter(|s| !s.is_empty())
        .map(normalize_serial)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_record(lang: &str, text: &str) -> NdefRecord {
        let mut data = vec![lang.len() as u8];
        data.extend_from_slice(lang.as_bytes());
        data.extend_from_slice(text.as_bytes());
        NdefRecord::new("text", data)
    }

    #[test]
    fn test_text_record_skips_language_code() {
        let record = text_record("en", "04A1B2C3D4E5F607");
        assert_eq!(record.device_id().as_deref(), Some("04A1B2C3D4E5F607"));
    }

    #[test]
    fn test_text_record_ignores_high_status_bits() {
        // 0x80 marks UTF-16 in NDEF; only the low six bits are a length
        let mut data = vec![0x80 | 2];
        data.extend_from_slice(b"enABC123");
        let record = NdefRecord::new("text", data);
        assert_eq!(record.device_id().as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_truncated_text_record_is_skipped() {
        let record = NdefRecord::new("text", vec![5, b'e', b'n']);
        assert!(record.device_id().is_none());
        assert!(NdefRecord::new("text", Vec::<u8>::new()).device_id().is_none());
    }

    #[test]
    fn test_url_record_extracts_embedded_id() {
        let record = NdefRecord::new("url", "https://waxx.example/verify?id=04a1b2c3d4e5f607&x=1");
        assert_eq!(record.device_id().as_deref(), Some("04A1B2C3D4E5F607"));
    }

    #[test]
    fn test_url_record_without_id_returns_url() {
        let record = NdefRecord::new("url", "https://waxx.example/verify");
        assert_eq!(record.device_id().as_deref(), Some("https://waxx.example/verify"));
    }

    #[test]
    fn test_mime_record_hex_is_uppercased() {
        let record = NdefRecord::new("mime", " 0a1b2c \n");
        assert_eq!(record.device_id().as_deref(), Some("0A1B2C"));

        let record = NdefRecord::new("unknown", "  device-7 ");
        assert_eq!(record.device_id().as_deref(), Some("device-7"));
    }

    #[test]
    fn test_unsupported_and_invalid_records_fall_through() {
        let records = vec![
            NdefRecord::new("smart-poster", "ignored"),
            NdefRecord::new("mime", vec![0xffu8, 0xfe]),
            text_record("en", "CAFEBABE00000001"),
        ];
        assert_eq!(
            resolve_device_id(&records, Some("04:00:00")).as_deref(),
            Some("CAFEBABE00000001")
        );
    }

    #[test]
    fn test_blank_written_id_falls_back_to_serial() {
        let blank_mime = [NdefRecord::new("mime", "   ")];
        assert_eq!(
            resolve_device_id(&blank_mime, Some("04:a1:b2")).as_deref(),
            Some("04A1B2")
        );

        let empty_text = [NdefRecord::new("text", vec![2u8, b'e', b'n'])];
        assert_eq!(
            resolve_device_id(&empty_text, Some("04:a1:b2")).as_deref(),
            Some("04A1B2")
        );

        let empty_url = [NdefRecord::new("url", "")];
        assert_eq!(
            resolve_device_id(&empty_url, Some("04-a1-b2")).as_deref(),
            Some("04A1B2")
        );
    }

    #[test]
    fn test_first_decoded_record_is_authoritative() {
        // A blank first record still wins over later records
        let records = vec![
            NdefRecord::new("unknown", " "),
            text_record("en", "CAFEBABE00000001"),
        ];
        assert_eq!(
            resolve_device_id(&records, Some("04:00")).as_deref(),
            Some("0400")
        );
        assert!(resolve_device_id(&records, None).is_none());
    }

    #[test]
    fn test_is_separated_serial() {
        assert!(is_separated_serial("04:a1:b2"));
        assert!(is_separated_serial("04-A1-B2-C3"));
        assert!(!is_separated_serial("04A1B2C3D4E5F607"));
        assert!(!is_separated_serial("https://waxx.example/verify"));
        assert!(!is_separated_serial("device-7"));
        assert!(!is_separated_serial("04::a1"));
    }

    #[test]
    fn test_serial_number_fallback() {
        assert_eq!(
            resolve_device_id(&[], Some("04:a1:b2-c3")).as_deref(),
            Some("04A1B2C3")
        );
        assert!(resolve_device_id(&[], Some("")).is_none());
        assert!(resolve_device_id(&[], None).is_none());
    }
}
