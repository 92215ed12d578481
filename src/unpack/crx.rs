use super::ExtractError;

// CRX3 layout: "Cr24" magic, u32 LE version, u32 LE header length, protobuf
// header, then the embedded ZIP data.
const HEADER_PREFIX_LEN: usize = 12;

/// Locate the ZIP payload inside a CRX3 wrapper.
pub fn zip_payload(data: &[u8]) -> Result<&[u8], ExtractError> {
    if data.len() < HEADER_PREFIX_LEN {
        return Err(ExtractError::Crx("file too small".into()));
    }
    if !data.starts_with(b"Cr24") {
        return Err(ExtractError::Crx("missing Cr24 magic".into()));
    }

    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != 3 {
        return Err(ExtractError::Crx(format!("unsupported CRX version {version}")));
    }

    let header_len = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
    let zip_start = HEADER_PREFIX_LEN + header_len;
    if zip_start >= data.len() {
        return Err(ExtractError::Crx("header length exceeds file size".into()));
    }

    Ok(&data[zip_start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_header_to_reach_payload() {
        let mut data = Vec::new();
        data.extend_from_slice(b"Cr24");
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"PK\x03\x04payload");

        let payload = zip_payload(&data).expect("payload");
        assert!(payload.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut data = Vec::new();
        data.extend_from_slice(b"Cr24");
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(b"zip");

        assert!(matches!(zip_payload(&data), Err(ExtractError::Crx(_))));
    }

    #[test]
    fn rejects_header_length_past_end() {
        let mut data = Vec::new();
        data.extend_from_slice(b"Cr24");
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&1000u32.to_le_bytes());
        data.extend_from_slice(b"tiny");

        assert!(matches!(zip_payload(&data), Err(ExtractError::Crx(_))));
    }
}
